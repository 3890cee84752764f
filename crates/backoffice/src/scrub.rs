//! # Parameter Scrubbing
//!
//! Advisory cleanup of submitted form values before any stage sees them. Only the
//! mutating actions are touched, and only the sub-map keyed by the resource's route key.
//! Validation is left to the changeset functions.

use crate::context::Params;
use serde_json::Value;
use tracing::trace;

pub struct ParamScrubber;

impl ParamScrubber {
    /// Returns `params` with the `params[resource_key]` sub-map normalized for
    /// `create` and `update`; every other action passes through unchanged.
    ///
    /// String values are trimmed, and strings left empty become `null`. Nested maps
    /// and lists are scrubbed recursively.
    pub fn scrub(mut params: Params, resource_key: &str, action: &str) -> Params {
        if !matches!(action, "create" | "update") {
            return params;
        }
        if let Some(Value::Object(fields)) = params.get_mut(resource_key) {
            trace!(resource_key, fields = fields.len(), "Scrubbing");
            for value in fields.values_mut() {
                scrub_value(value);
            }
        }
        params
    }
}

fn scrub_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            let trimmed = s.trim().to_string();
            *value = if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed)
            };
        }
        Value::Object(map) => map.values_mut().for_each(scrub_value),
        Value::Array(items) => items.iter_mut().for_each(scrub_value),
        _ => {}
    }
}
