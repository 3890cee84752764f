//! # Store Client
//!
//! Cheap-to-clone handle for a [`StoreActor`](super::StoreActor).

use super::message::StoreRequest;
use crate::error::RepoError;
use crate::model::{Id, Record};
use crate::repo::{IndexQuery, Page};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone)]
pub struct StoreClient {
    source: String,
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(source: impl Into<String>, sender: mpsc::Sender<StoreRequest>) -> Self {
        Self {
            source: source.into(),
            sender,
        }
    }

    /// The model source this store holds.
    pub fn source(&self) -> &str {
        &self.source
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, RepoError>>) -> StoreRequest,
    ) -> Result<T, RepoError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| RepoError::StoreClosed)?;
        response.await.map_err(|_| RepoError::StoreDropped)?
    }

    #[tracing::instrument(skip(self), fields(source = %self.source))]
    pub async fn query(&self, query: IndexQuery) -> Result<Page, RepoError> {
        self.request(|respond_to| StoreRequest::Query { query, respond_to })
            .await
    }

    #[tracing::instrument(skip(self), fields(source = %self.source))]
    pub async fn get(&self, id: Id) -> Result<Option<Record>, RepoError> {
        self.request(|respond_to| StoreRequest::Get { id, respond_to })
            .await
    }

    pub async fn all(&self) -> Result<Vec<Record>, RepoError> {
        self.request(|respond_to| StoreRequest::All { respond_to })
            .await
    }

    pub async fn insert(&self, fields: Map<String, Value>) -> Result<Record, RepoError> {
        self.request(|respond_to| StoreRequest::Insert { fields, respond_to })
            .await
    }

    pub async fn update(&self, id: Id, changes: Map<String, Value>) -> Result<Record, RepoError> {
        self.request(|respond_to| StoreRequest::Update {
            id,
            changes,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: Id) -> Result<(), RepoError> {
        self.request(|respond_to| StoreRequest::Delete { id, respond_to })
            .await
    }
}
