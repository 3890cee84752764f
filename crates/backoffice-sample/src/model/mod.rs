//! Models managed through the admin surface.
//!
//! `Contact` and `Survey` are declarative [`Schema`](backoffice::Schema)s; `Widget`
//! has a typed representation and its own validator.

pub mod contact;
pub mod survey;
pub mod widget;

pub use contact::{contact_schema, CONTACTS};
pub use survey::{survey_schema, SURVEYS};
pub use widget::{Widget, WidgetModel, WIDGETS};
