//! # Mock Repo & Testing Guide
//!
//! [`MockRepo`] implements the [`Repo`] contract from a queue of expectations. Each
//! repo call pops the next expectation; a call that does not match it panics with
//! "Unexpected request or expectation mismatch". Every call is also recorded so tests
//! can assert on what the dispatch core did (or did not) ask the persistence layer.
//!
//! ## When to use the mock vs the memory store
//!
//! | | MockRepo | MemoryRepo |
//! |---|---|---|
//! | **State** | None (scripted answers) | Real records in store actors |
//! | **Error injection** | Easy (`return_err`) | Hard |
//! | **Use case** | Asserting which repo calls a handler makes | End-to-end flows |
//!
//! ## Example
//!
//! ```rust
//! use backoffice::mock::{MockRepo, RepoCall};
//! use backoffice::{FetchKind, Record, Repo, RepoError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockRepo::new();
//!     mock.expect_fetch(7).return_ok(Record::with_id(7).field("name", "Bolt"));
//!     mock.expect_delete(7).return_err(RepoError::Backend("disk full".into()));
//!
//!     let record = mock.fetch("widgets", FetchKind::Edit, 7).await.unwrap();
//!     assert!(mock.delete("widgets", record).await.is_err());
//!
//!     mock.verify();
//!     assert_eq!(mock.calls().len(), 2);
//!     assert!(matches!(mock.calls()[1], RepoCall::Delete { id: Some(7), .. }));
//! }
//! ```

use crate::changeset::Changeset;
use crate::error::RepoError;
use crate::model::{Id, Record};
use crate::repo::{FetchKind, IndexQuery, Page, Repo};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A repo call as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    Index { source: String, query: IndexQuery },
    Fetch { source: String, kind: FetchKind, id: Id },
    Export { source: String },
    Insert { source: String, changes: Map<String, Value> },
    Update { source: String, id: Option<Id>, changes: Map<String, Value> },
    Delete { source: String, id: Option<Id> },
    Get { source: String, id: Id },
}

enum Expectation {
    Index(Result<Page, RepoError>),
    Fetch { id: Id, response: Result<Record, RepoError> },
    Export(Result<Vec<Record>, RepoError>),
    Insert(Result<Record, RepoError>),
    Update { id: Id, response: Result<Record, RepoError> },
    Delete { id: Id, response: Result<(), RepoError> },
    Get { id: Id, response: Result<Option<Record>, RepoError> },
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn mismatch() -> ! {
    panic!("Unexpected request or expectation mismatch");
}

/// Expectation-driven [`Repo`] double. Clones share the same queue and call log.
#[derive(Clone, Default)]
pub struct MockRepo {
    expectations: Queue,
    calls: Arc<Mutex<Vec<RepoCall>>>,
}

impl MockRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_index(&self) -> ExpectationBuilder<Page> {
        ExpectationBuilder::new(&self.expectations, Expectation::Index)
    }

    /// Expects a `fetch` (show or edit) of `id`.
    pub fn expect_fetch(&self, id: Id) -> ExpectationBuilder<Record> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::Fetch {
            id,
            response,
        })
    }

    pub fn expect_export(&self) -> ExpectationBuilder<Vec<Record>> {
        ExpectationBuilder::new(&self.expectations, Expectation::Export)
    }

    pub fn expect_insert(&self) -> ExpectationBuilder<Record> {
        ExpectationBuilder::new(&self.expectations, Expectation::Insert)
    }

    pub fn expect_update(&self, id: Id) -> ExpectationBuilder<Record> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::Update {
            id,
            response,
        })
    }

    pub fn expect_delete(&self, id: Id) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::Delete {
            id,
            response,
        })
    }

    pub fn expect_get(&self, id: Id) -> ExpectationBuilder<Option<Record>> {
        ExpectationBuilder::new(&self.expectations, move |response| Expectation::Get {
            id,
            response,
        })
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RepoCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&RepoCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| pred(call)).count()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }

    fn next(&self, call: RepoCall) -> Expectation {
        lock(&self.calls).push(call);
        lock(&self.expectations)
            .pop_front()
            .unwrap_or_else(|| mismatch())
    }
}

/// Fluent builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T> {
    expectations: Queue,
    make: Box<dyn FnOnce(Result<T, RepoError>) -> Expectation>,
}

impl<T> ExpectationBuilder<T> {
    fn new(
        expectations: &Queue,
        make: impl FnOnce(Result<T, RepoError>) -> Expectation + 'static,
    ) -> Self {
        Self {
            expectations: Arc::clone(expectations),
            make: Box::new(make),
        }
    }

    pub fn return_ok(self, value: T) {
        let expectation = (self.make)(Ok(value));
        lock(&self.expectations).push_back(expectation);
    }

    pub fn return_err(self, error: RepoError) {
        let expectation = (self.make)(Err(error));
        lock(&self.expectations).push_back(expectation);
    }
}

#[async_trait]
impl Repo for MockRepo {
    async fn index(&self, source: &str, query: &IndexQuery) -> Result<Page, RepoError> {
        match self.next(RepoCall::Index {
            source: source.to_string(),
            query: query.clone(),
        }) {
            Expectation::Index(response) => response,
            _ => mismatch(),
        }
    }

    async fn fetch(&self, source: &str, kind: FetchKind, id: Id) -> Result<Record, RepoError> {
        match self.next(RepoCall::Fetch {
            source: source.to_string(),
            kind,
            id,
        }) {
            Expectation::Fetch { id: expected, response } if expected == id => response,
            _ => mismatch(),
        }
    }

    async fn export(&self, source: &str) -> Result<Vec<Record>, RepoError> {
        match self.next(RepoCall::Export {
            source: source.to_string(),
        }) {
            Expectation::Export(response) => response,
            _ => mismatch(),
        }
    }

    async fn insert(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError> {
        match self.next(RepoCall::Insert {
            source: source.to_string(),
            changes: changeset.changes,
        }) {
            Expectation::Insert(response) => response,
            _ => mismatch(),
        }
    }

    async fn update(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError> {
        let id = changeset.data.id;
        match self.next(RepoCall::Update {
            source: source.to_string(),
            id,
            changes: changeset.changes,
        }) {
            Expectation::Update { id: expected, response } if Some(expected) == id => response,
            _ => mismatch(),
        }
    }

    async fn delete(&self, source: &str, record: Record) -> Result<(), RepoError> {
        let id = record.id;
        match self.next(RepoCall::Delete {
            source: source.to_string(),
            id,
        }) {
            Expectation::Delete { id: expected, response } if Some(expected) == id => response,
            _ => mismatch(),
        }
    }

    async fn get(&self, source: &str, id: Id) -> Result<Option<Record>, RepoError> {
        match self.next(RepoCall::Get {
            source: source.to_string(),
            id,
        }) {
            Expectation::Get { id: expected, response } if expected == id => response,
            _ => mismatch(),
        }
    }
}
