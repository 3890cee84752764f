use crate::model::{contact_schema, CONTACTS};
use backoffice::{IndexFilter, ResourceDefinition};
use serde_json::Value;

pub fn resource() -> ResourceDefinition {
    ResourceDefinition::builder(CONTACTS, contact_schema())
        .menu_priority(1)
        .index_filter(IndexFilter::new("name"))
        .index_filter(IndexFilter::new("email"))
        .show_view(|_ctx, record| {
            let text = |field: &str| {
                record
                    .get(field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            format!("Contact: {} <{}>", text("name"), text("email"))
        })
        .build()
}
