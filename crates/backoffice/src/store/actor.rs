//! # Store Actor
//!
//! The server half of an in-memory record store. One actor owns the records of one
//! model source and processes requests sequentially, so the map needs no locking.

use super::client::StoreClient;
use super::message::StoreRequest;
use crate::error::RepoError;
use crate::model::{Id, Record};
use crate::repo::{compare_values, IndexQuery, Page};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns the records of one source.
///
/// ```rust
/// use backoffice::store::StoreActor;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = StoreActor::new("widgets", 16);
///     let handle = tokio::spawn(actor.run());
///
///     let mut fields = serde_json::Map::new();
///     fields.insert("name".into(), json!("Sprocket"));
///     let created = client.insert(fields).await.unwrap();
///     assert_eq!(created.id, Some(1));
///
///     drop(client);
///     handle.await.unwrap();
/// }
/// ```
pub struct StoreActor {
    source: String,
    receiver: mpsc::Receiver<StoreRequest>,
    records: BTreeMap<Id, Record>,
    next_id: Id,
}

impl StoreActor {
    /// Creates the actor and its client. `buffer_size` is the channel capacity;
    /// callers wait when it is full.
    pub fn new(source: impl Into<String>, buffer_size: usize) -> (Self, StoreClient) {
        let source = source.into();
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            source: source.clone(),
            receiver,
            records: BTreeMap::new(),
            next_id: 1,
        };
        (actor, StoreClient::new(source, sender))
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        let name = self.source.clone();
        let source = name.as_str();
        info!(source, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Query { query, respond_to } => {
                    let page = self.query(&query);
                    debug!(source, total = page.total_entries, "Query");
                    let _ = respond_to.send(Ok(page));
                }
                StoreRequest::Get { id, respond_to } => {
                    let record = self.records.get(&id).cloned();
                    debug!(source, id, found = record.is_some(), "Get");
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::All { respond_to } => {
                    let _ = respond_to.send(Ok(self.records.values().cloned().collect()));
                }
                StoreRequest::Insert { fields, respond_to } => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let record = Record {
                        id: Some(id),
                        fields,
                    };
                    self.records.insert(id, record.clone());
                    info!(source, id, size = self.records.len(), "Inserted");
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::Update {
                    id,
                    changes,
                    respond_to,
                } => {
                    let result = match self.records.get_mut(&id) {
                        Some(record) => {
                            record.fields.extend(changes);
                            info!(source, id, "Updated");
                            Ok(record.clone())
                        }
                        None => Err(not_found(source, id)),
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete { id, respond_to } => {
                    let result = match self.records.remove(&id) {
                        Some(_) => {
                            info!(source, id, size = self.records.len(), "Deleted");
                            Ok(())
                        }
                        None => Err(not_found(source, id)),
                    };
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(source, size = self.records.len(), "Shutdown");
    }

    fn query(&self, query: &IndexQuery) -> Page {
        let mut matched: Vec<Record> = self
            .records
            .values()
            .filter(|record| {
                query
                    .filters
                    .iter()
                    .all(|(field, wanted)| matches_filter(record.get(field), wanted))
            })
            .cloned()
            .collect();

        let field = query.order.field.as_str();
        matched.sort_by(|a, b| {
            let ordering = if field == "id" {
                a.id.cmp(&b.id)
            } else {
                compare_values(a.get(field), b.get(field)).then_with(|| a.id.cmp(&b.id))
            };
            if query.order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        Page::paginate(matched, query.page, query.per_page)
    }
}

fn not_found(source: &str, id: Id) -> RepoError {
    warn!(source, id, "Not found");
    RepoError::NotFound {
        resource: source.to_string(),
        id: id.to_string(),
    }
}

/// Blank wanted values match everything. Strings match case-insensitively by
/// substring; anything else must be equal.
fn matches_filter(actual: Option<&Value>, wanted: &Value) -> bool {
    match wanted {
        Value::Null => true,
        Value::String(w) if w.trim().is_empty() => true,
        Value::String(w) => match actual {
            Some(Value::String(a)) => a.to_lowercase().contains(&w.trim().to_lowercase()),
            Some(other) => other.to_string() == w.trim(),
            None => false,
        },
        other => actual == Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminConfig;
    use crate::context::Params;
    use serde_json::{json, Map};

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_crud_round() {
        let (actor, client) = StoreActor::new("widgets", 8);
        let handle = tokio::spawn(actor.run());

        let a = client.insert(fields(json!({"name": "Bolt"}))).await.unwrap();
        let b = client.insert(fields(json!({"name": "Nut"}))).await.unwrap();
        assert_eq!((a.id, b.id), (Some(1), Some(2)));

        let updated = client.update(1, fields(json!({"price": 3}))).await.unwrap();
        assert_eq!(updated.get("name"), Some(&json!("Bolt")));
        assert_eq!(updated.get("price"), Some(&json!(3)));

        client.delete(2).await.unwrap();
        assert!(client.get(2).await.unwrap().is_none());
        assert!(matches!(
            client.delete(2).await,
            Err(RepoError::NotFound { .. })
        ));

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let (actor, client) = StoreActor::new("contacts", 8);
        tokio::spawn(actor.run());
        for name in ["Ann", "bob", "Annie", "Carl"] {
            client.insert(fields(json!({ "name": name }))).await.unwrap();
        }

        let mut params = Params::new();
        params.insert("q".into(), json!({"name": "ann"}));
        params.insert("order".into(), json!("name_asc"));
        let query = IndexQuery::from_params(&params, &[], &AdminConfig::default());

        let page = client.query(query).await.unwrap();
        let names: Vec<&Value> = page.entries.iter().filter_map(|r| r.get("name")).collect();
        assert_eq!(names, vec![&json!("Ann"), &json!("Annie")]);

        let page = client
            .query(IndexQuery::from_params(&Params::new(), &[], &AdminConfig::default()))
            .await
            .unwrap();
        assert_eq!(page.entries[0].id, Some(4));
    }

    #[test]
    fn test_matches_filter() {
        assert!(matches_filter(Some(&json!(3)), &json!("3")));
        assert!(matches_filter(Some(&json!(true)), &json!(true)));
        assert!(!matches_filter(None, &json!("x")));
        assert!(matches_filter(None, &json!("")));
    }
}
