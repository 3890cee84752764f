//! # Action Resolution
//!
//! Maps an action name to the handler that governs it. Precedence, first match wins:
//!
//! 1. the resource's member actions;
//! 2. the resource's collection actions;
//! 3. the built-in CRUD vocabulary.
//!
//! Anything else is [`DispatchError::UnknownAction`].

use crate::context::Params;
use crate::error::DispatchError;
use crate::resource::{CollectionAction, MemberAction, ResourceDefinition};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Pseudo-action for nested field (AJAX) sub-rendering.
pub const NESTED_ACTION: &str = "nested";

/// Wire name of the batch action; the sub-kind travels in the `batch_action` param.
pub const BATCH_ACTION: &str = "batch_action";

/// The built-in action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    Index,
    Show,
    New,
    Edit,
    Create,
    Update,
    Destroy,
    BatchDestroy,
    Csv,
    Nested,
}

impl BuiltinAction {
    /// Recognizes a request action. `batch_action` only resolves when its
    /// sub-kind is `"destroy"`.
    pub fn from_request(action: &str, params: &Params) -> Option<Self> {
        let builtin = match action {
            "index" => BuiltinAction::Index,
            "show" => BuiltinAction::Show,
            "new" => BuiltinAction::New,
            "edit" => BuiltinAction::Edit,
            "create" => BuiltinAction::Create,
            "update" => BuiltinAction::Update,
            "destroy" => BuiltinAction::Destroy,
            "csv" => BuiltinAction::Csv,
            NESTED_ACTION => BuiltinAction::Nested,
            BATCH_ACTION => match params.get(BATCH_ACTION).and_then(Value::as_str) {
                Some("destroy") => BuiltinAction::BatchDestroy,
                _ => return None,
            },
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAction::Index => "index",
            BuiltinAction::Show => "show",
            BuiltinAction::New => "new",
            BuiltinAction::Edit => "edit",
            BuiltinAction::Create => "create",
            BuiltinAction::Update => "update",
            BuiltinAction::Destroy => "destroy",
            BuiltinAction::BatchDestroy => BATCH_ACTION,
            BuiltinAction::Csv => "csv",
            BuiltinAction::Nested => NESTED_ACTION,
        }
    }
}

/// The handler selected for a request.
#[derive(Clone)]
pub enum Handler {
    Member(Arc<dyn MemberAction>),
    Collection(Arc<dyn CollectionAction>),
    Builtin(BuiltinAction),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Member(_) => f.write_str("Member"),
            Handler::Collection(_) => f.write_str("Collection"),
            Handler::Builtin(action) => write!(f, "Builtin({action:?})"),
        }
    }
}

pub struct ActionResolver;

impl ActionResolver {
    pub fn resolve(
        resource: &ResourceDefinition,
        action: &str,
        params: &Params,
    ) -> Result<Handler, DispatchError> {
        if let Some(member) = resource.member_actions().get(action) {
            return Ok(Handler::Member(Arc::clone(member)));
        }
        if let Some(collection) = resource.collection_actions().get(action) {
            return Ok(Handler::Collection(Arc::clone(collection)));
        }
        BuiltinAction::from_request(action, params)
            .map(Handler::Builtin)
            .ok_or_else(|| DispatchError::UnknownAction {
                resource: resource.route_key().to_string(),
                action: action.to_string(),
            })
    }

    /// True when `action` resolves to the built-in `nested` pseudo-action. A member or
    /// collection action registered under that name takes precedence and is not exempt
    /// from interceptors.
    pub fn is_builtin_nested(resource: &ResourceDefinition, action: &str) -> bool {
        action == NESTED_ACTION
            && !resource.member_actions().contains_key(action)
            && !resource.collection_actions().contains_key(action)
    }
}
