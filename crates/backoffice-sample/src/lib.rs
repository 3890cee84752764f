//! # Backoffice Sample App
//!
//! A small admin surface over three models, wired the way a host application would
//! wire the `backoffice` dispatch core. Exposed as a library for the integration tests.

pub mod admin;
pub mod lifecycle;
pub mod model;

pub use lifecycle::{AdminSystem, SystemError};
