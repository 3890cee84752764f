//! # Action Outcomes
//!
//! What a handler hands back to the dispatcher, and the host-facing response the
//! dispatcher builds from it.

use crate::changeset::ErrorMap;
use crate::context::Flash;
use crate::model::Record;

/// The result of a successfully executed action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Content produced by a view, optionally with the record it shows.
    Rendered {
        content: String,
        resource: Option<Record>,
    },
    Redirected { location: String },
    /// The changeset was rejected; the form was re-rendered with the candidate values.
    ValidationFailed { content: String, errors: ErrorMap },
}

impl ActionOutcome {
    pub fn rendered(content: impl Into<String>) -> Self {
        ActionOutcome::Rendered {
            content: content.into(),
            resource: None,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        ActionOutcome::Redirected {
            location: location.into(),
        }
    }

    /// The rendered body, if this outcome has one.
    pub fn content(&self) -> Option<&str> {
        match self {
            ActionOutcome::Rendered { content, .. }
            | ActionOutcome::ValidationFailed { content, .. } => Some(content),
            ActionOutcome::Redirected { .. } => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            ActionOutcome::Redirected { location } => Some(location),
            _ => None,
        }
    }
}

/// A finished response: status, headers and body, plus the flash to carry over.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub flash: Vec<Flash>,
    /// `None` when the request failed.
    pub outcome: Option<ActionOutcome>,
}

impl AdminResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}
