use super::client::StoreClient;
use crate::changeset::Changeset;
use crate::error::RepoError;
use crate::model::{Id, Record};
use crate::repo::{FetchKind, IndexQuery, Page, Repo};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Routes [`Repo`] calls to per-source store actors.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    stores: HashMap<String, StoreClient>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the client for its source, replacing any previous one.
    pub fn with_store(mut self, client: StoreClient) -> Self {
        self.stores.insert(client.source().to_string(), client);
        self
    }

    pub fn store(&self, source: &str) -> Result<&StoreClient, RepoError> {
        self.stores
            .get(source)
            .ok_or_else(|| RepoError::Backend(format!("No store for source {source}")))
    }
}

fn persisted_id(source: &str, record: &Record) -> Result<Id, RepoError> {
    record
        .id
        .ok_or_else(|| RepoError::Backend(format!("Unsaved {source} record has no id")))
}

#[async_trait]
impl Repo for MemoryRepo {
    async fn index(&self, source: &str, query: &IndexQuery) -> Result<Page, RepoError> {
        self.store(source)?.query(query.clone()).await
    }

    async fn fetch(&self, source: &str, kind: FetchKind, id: Id) -> Result<Record, RepoError> {
        debug!(source, ?kind, id, "Fetch");
        self.store(source)?
            .get(id)
            .await?
            .ok_or_else(|| RepoError::NotFound {
                resource: source.to_string(),
                id: id.to_string(),
            })
    }

    async fn export(&self, source: &str) -> Result<Vec<Record>, RepoError> {
        self.store(source)?.all().await
    }

    async fn insert(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError> {
        let fields = changeset.apply_changes().fields;
        self.store(source)?.insert(fields).await
    }

    async fn update(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError> {
        let id = persisted_id(source, &changeset.data)?;
        self.store(source)?.update(id, changeset.changes).await
    }

    async fn delete(&self, source: &str, record: Record) -> Result<(), RepoError> {
        let id = persisted_id(source, &record)?;
        self.store(source)?.delete(id).await
    }

    async fn get(&self, source: &str, id: Id) -> Result<Option<Record>, RepoError> {
        self.store(source)?.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreActor;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_by_source() {
        let (actor, client) = StoreActor::new("widgets", 8);
        tokio::spawn(actor.run());
        let repo = MemoryRepo::new().with_store(client);

        let mut params = crate::Params::new();
        params.insert("name".into(), json!("Bolt"));
        let changeset = Changeset::new(Record::new()).cast(&params, &["name"]);
        let created = repo.insert("widgets", changeset).await.unwrap();

        let fetched = repo
            .fetch("widgets", FetchKind::Show, created.id.unwrap())
            .await
            .unwrap();
        assert_eq!(fetched.get("name"), Some(&json!("Bolt")));

        assert!(matches!(
            repo.fetch("widgets", FetchKind::Edit, 99).await,
            Err(RepoError::NotFound { .. })
        ));
        assert!(matches!(repo.export("gadgets").await, Err(RepoError::Backend(_))));
    }
}
