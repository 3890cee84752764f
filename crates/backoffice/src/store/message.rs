//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](super::StoreClient) to its
//! [`StoreActor`](super::StoreActor). Each carries a oneshot sender the actor
//! answers on.

use crate::error::RepoError;
use crate::model::{Id, Record};
use crate::repo::{IndexQuery, Page};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

/// One-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, RepoError>>;

#[derive(Debug)]
pub enum StoreRequest {
    Query {
        query: IndexQuery,
        respond_to: Response<Page>,
    },
    Get {
        id: Id,
        respond_to: Response<Option<Record>>,
    },
    /// Every record, ordered by id.
    All { respond_to: Response<Vec<Record>> },
    Insert {
        fields: Map<String, Value>,
        respond_to: Response<Record>,
    },
    Update {
        id: Id,
        changes: Map<String, Value>,
        respond_to: Response<Record>,
    },
    Delete { id: Id, respond_to: Response<()> },
}
