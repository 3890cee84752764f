//! # Changesets
//!
//! A [`Changeset`] is a candidate set of field changes against a record, plus the
//! structured errors found while validating them. The persistence layer validates
//! changes by running a changeset function; [`ChangesetValidator`] only decides *which*
//! function applies and normalizes the result into a [`Validation`].

use crate::context::Params;
use crate::model::Record;
use crate::repo::Repo;
use crate::resource::ResourceDefinition;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Field name -> error messages, ordered by field for stable rendering.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// A per-action change validator registered on a resource.
pub type ChangesetFn = Arc<dyn Fn(&Record, &Params) -> Changeset + Send + Sync>;

pub const BLANK_MESSAGE: &str = "can't be blank";

#[derive(Debug, Clone, PartialEq)]
pub struct Changeset {
    /// The record the changes apply to.
    pub data: Record,
    pub changes: Map<String, Value>,
    pub errors: ErrorMap,
}

impl Changeset {
    pub fn new(data: Record) -> Self {
        Self {
            data,
            changes: Map::new(),
            errors: ErrorMap::new(),
        }
    }

    /// Copies the permitted keys present in `params` into `changes`,
    /// skipping values equal to what the record already holds.
    pub fn cast<S: AsRef<str>>(mut self, params: &Params, permitted: &[S]) -> Self {
        for key in permitted {
            let key = key.as_ref();
            if let Some(value) = params.get(key) {
                if self.data.get(key) != Some(value) {
                    self.changes.insert(key.to_string(), value.clone());
                }
            }
        }
        self
    }

    /// Adds a "can't be blank" error for every field that is missing, null or an empty string
    /// once the changes are applied.
    pub fn validate_required<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        for field in fields {
            let field = field.as_ref();
            let value = self.changes.get(field).or_else(|| self.data.get(field));
            let blank = match value {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                self.add_error(field, BLANK_MESSAGE);
            }
        }
        self
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The record with every change applied. For a rejected changeset this is
    /// the candidate re-rendered in the form.
    pub fn apply_changes(&self) -> Record {
        let mut record = self.data.clone();
        for (key, value) in &self.changes {
            record.fields.insert(key.clone(), value.clone());
        }
        record
    }
}

/// Normalized outcome of validating a changeset.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Changeset),
    Invalid { errors: ErrorMap, candidate: Record },
}

/// Selects the changeset function for an action and runs it through the repo.
pub struct ChangesetValidator;

impl ChangesetValidator {
    /// Validates `field_params` against `instance` for `action` (`create` or `update`).
    ///
    /// A function registered on the resource for `action` wins; otherwise the model's
    /// default validator applies.
    pub fn validate(
        repo: &dyn Repo,
        resource: &ResourceDefinition,
        action: &str,
        instance: &Record,
        field_params: &Params,
    ) -> Validation {
        let changeset = match resource.changeset_fn(action) {
            Some(custom) => {
                debug!(resource = resource.route_key(), action, "Custom changeset");
                repo.validate_change(&**custom, instance, field_params)
            }
            None => {
                let model = resource.model();
                let default = |record: &Record, params: &Params| model.default_changeset(record, params);
                repo.validate_change(&default, instance, field_params)
            }
        };

        if changeset.is_valid() {
            Validation::Valid(changeset)
        } else {
            Validation::Invalid {
                candidate: changeset.apply_changes(),
                errors: changeset.errors,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_cast_skips_unchanged_values() {
        let record = Record::with_id(1).field("name", "Sprocket");
        let changeset = Changeset::new(record).cast(
            &params(&[("name", json!("Sprocket")), ("price", json!(4))]),
            &["name", "price"],
        );
        assert!(changeset.changes.get("name").is_none());
        assert_eq!(changeset.changes.get("price"), Some(&json!(4)));
    }

    #[test]
    fn test_validate_required_uses_existing_data() {
        let record = Record::with_id(1).field("name", "Sprocket");
        let changeset = Changeset::new(record)
            .cast(&params(&[("sku", json!("  "))]), &["sku"])
            .validate_required(&["name", "sku"]);

        assert_eq!(changeset.errors.len(), 1);
        assert_eq!(changeset.errors["sku"], vec![BLANK_MESSAGE.to_string()]);
    }

    #[test]
    fn test_apply_changes_keeps_rejected_values() {
        let changeset = Changeset::new(Record::new())
            .cast(&params(&[("name", json!("")), ("price", json!(9))]), &["name", "price"])
            .validate_required(&["name"]);
        let candidate = changeset.apply_changes();
        assert_eq!(candidate.get("price"), Some(&json!(9)));
        assert_eq!(candidate.get("name"), Some(&json!("")));
    }
}
