//! # Admin Registrations
//!
//! Builds the [`ResourceRegistry`] for the sample app:
//!
//! | Route key | Model | Menu priority | Extras |
//! |---|---|---|---|
//! | `contacts` | `Contact` schema | 1 | index filters, custom show view |
//! | `surveys` | `Survey` schema | 2 | `summary` collection action |
//! | `widgets` | `WidgetModel` | 3 | `publish` member action, `set_owner` before-filter, owner picker |
//!
//! Every resource inherits the [`RequireRole`] default interceptor installed by
//! [`AdminSystem`](crate::AdminSystem); `widgets` overrides its options so editors
//! may manage widgets too.

mod contacts;
mod roles;
mod surveys;
mod widgets;

pub use roles::{RequireRole, CURRENT_USER_ID, CURRENT_USER_ROLE};
pub use surveys::Summary;
pub use widgets::{ContactOptions, Publish};

use backoffice::{AdminConfig, RegistryError, Repo, ResourceRegistry};
use std::sync::Arc;

pub fn build_registry(
    repo: Arc<dyn Repo>,
    config: &AdminConfig,
) -> Result<ResourceRegistry, RegistryError> {
    Ok(ResourceRegistry::builder()
        .register(contacts::resource())?
        .register(surveys::resource(Arc::clone(&repo)))?
        .register(widgets::resource(repo, config))?
        .build())
}
