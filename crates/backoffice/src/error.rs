//! # Dispatch Errors
//!
//! This module defines the error types used throughout the dispatch core.
//! Fatal kinds abort the request and are mapped to a generic error response by
//! [`Dispatcher::handle`](crate::Dispatcher::handle). Validation failures are *not*
//! errors: they are a normal [`ActionOutcome`](crate::ActionOutcome).

/// Errors raised by the persistence contract ([`Repo`](crate::Repo)).
///
/// The dispatch core never translates these; they propagate upward unmodified
/// inside [`DispatchError::Repo`].
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RepoError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },
    #[error("Store closed")]
    StoreClosed,
    #[error("Store dropped response channel")]
    StoreDropped,
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors that abort a dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No resource is registered under the requested route key.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Neither the custom action maps nor the built-in set know the action.
    #[error("Unknown action {action} for resource {resource}")]
    UnknownAction { resource: String, action: String },

    /// The interceptor pipeline set the `authorized` assign to `false`.
    #[error("Unauthorized: {action} on {resource}")]
    Unauthorized { resource: String, action: String },

    /// Nested field resolution found no input with the requested name.
    #[error("No input named {field} in the form of {resource}")]
    NestedFieldNotFound { resource: String, field: String },

    /// An id param could not be parsed as an integer.
    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    /// An interceptor or hook aborted the request.
    #[error("Interceptor {name} halted: {reason}")]
    Interceptor { name: String, reason: String },

    /// The layout failed to serialize an export.
    #[error("Export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl DispatchError {
    /// True for the routing failures: an unknown resource key or an unresolved action.
    pub fn is_unknown_route(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownResource(_) | DispatchError::UnknownAction { .. }
        )
    }

    /// The generic HTTP status the host should answer with.
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::UnknownResource(_)
            | DispatchError::UnknownAction { .. }
            | DispatchError::NestedFieldNotFound { .. }
            | DispatchError::Repo(RepoError::NotFound { .. }) => 404,
            DispatchError::Unauthorized { .. } => 403,
            DispatchError::InvalidId(_) => 400,
            DispatchError::Interceptor { .. }
            | DispatchError::Export(_)
            | DispatchError::Repo(_) => 500,
        }
    }
}
