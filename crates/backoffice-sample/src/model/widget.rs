//! Widgets: a typed model with its own change validator.

use backoffice::{Changeset, Model, Params, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const WIDGETS: &str = "widgets";

const PERMITTED: [&str; 3] = ["name", "price", "owner_id"];

/// Typed view of a widget record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub published: bool,
}

impl Widget {
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record.fields.clone()))
    }
}

/// Model reference registered for the `widgets` resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetModel;

impl Model for WidgetModel {
    fn name(&self) -> &str {
        "Widget"
    }

    fn source(&self) -> &str {
        WIDGETS
    }

    fn blank(&self) -> Record {
        let mut fields = Map::new();
        fields.insert("published".into(), Value::Bool(false));
        Record { id: None, fields }
    }

    /// `name` is required; `price` must be a non-negative number and `owner_id` an
    /// integer. Numeric strings from form posts are converted.
    fn default_changeset(&self, record: &Record, params: &Params) -> Changeset {
        let mut changeset = Changeset::new(record.clone())
            .cast(params, &PERMITTED)
            .validate_required(&["name"]);

        if let Some(raw) = changeset.changes.get("price").cloned() {
            let price = match &raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match price {
                Some(p) if p >= 0.0 => {
                    changeset.changes.insert("price".into(), Value::from(p));
                }
                _ => changeset.add_error("price", "must be a non-negative number"),
            }
        }

        match changeset.changes.get("owner_id").cloned() {
            Some(Value::String(raw)) => match raw.trim().parse::<u64>() {
                Ok(owner) => {
                    changeset.changes.insert("owner_id".into(), Value::from(owner));
                }
                Err(_) => changeset.add_error("owner_id", "is invalid"),
            },
            Some(Value::Null) | Some(Value::Number(_)) | None => {}
            Some(_) => changeset.add_error("owner_id", "is invalid"),
        }
        changeset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_price_is_converted() {
        let changeset = WidgetModel.default_changeset(
            &WidgetModel.blank(),
            &params(json!({"name": "Bolt", "price": "2.5"})),
        );
        assert!(changeset.is_valid());
        assert_eq!(changeset.changes["price"], json!(2.5));
    }

    #[test]
    fn test_negative_price_rejected() {
        let changeset = WidgetModel.default_changeset(
            &WidgetModel.blank(),
            &params(json!({"name": "Bolt", "price": -1})),
        );
        assert_eq!(
            changeset.errors["price"],
            vec!["must be a non-negative number".to_string()]
        );
    }

    #[test]
    fn test_owner_id_from_form_post() {
        let changeset = WidgetModel.default_changeset(
            &WidgetModel.blank(),
            &params(json!({"name": "Bolt", "owner_id": "4"})),
        );
        assert_eq!(changeset.changes["owner_id"], json!(4));

        let changeset = WidgetModel.default_changeset(
            &WidgetModel.blank(),
            &params(json!({"name": "Bolt", "owner_id": "four"})),
        );
        assert!(!changeset.is_valid());
    }

    #[test]
    fn test_from_record() {
        let record = Record::with_id(1).field("name", "Bolt").field("price", 3);
        let widget = Widget::from_record(&record).unwrap();
        assert_eq!(widget.name, "Bolt");
        assert!(!widget.published);
        assert_eq!(widget.owner_id, None);
    }
}
