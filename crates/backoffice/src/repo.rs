//! # Persistence Contract
//!
//! The [`Repo`] trait is the narrow contract the dispatch core consumes from the
//! persistence layer: query execution for the index/show/edit/csv actions, change
//! validation, and insert/update/delete. Errors are returned as [`RepoError`] and
//! never translated by the core.
//!
//! Calls are awaited one after another; the dispatcher does not care whether the
//! implementation blocks, talks to a database or to an in-process actor
//! (see [`crate::store::MemoryRepo`]).

use crate::changeset::Changeset;
use crate::config::AdminConfig;
use crate::context::Params;
use crate::error::RepoError;
use crate::model::{Id, Record};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Which single-record query is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Show,
    Edit,
}

/// A filter spec declared on a resource. Opaque to the core: it is handed to the
/// repo with every index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFilter {
    pub field: String,
    #[serde(default)]
    pub options: Value,
}

impl IndexFilter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            options: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    /// Parses `name_asc` / `id_desc`. A bare field name sorts ascending.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let (field, descending) = match raw.rsplit_once('_') {
            Some((field, "desc")) => (field, true),
            Some((field, "asc")) => (field, false),
            _ => (raw, false),
        };
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// Arguments of the `index` query.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
    pub order: SortOrder,
    /// Field -> wanted value, from the `q` param.
    pub filters: Params,
    pub filter_specs: Vec<IndexFilter>,
}

impl IndexQuery {
    /// Reads `page`, `per_page`, `order` and `q` from the request params.
    ///
    /// Numbers may arrive as strings. `per_page` is clamped to `config.max_per_page`;
    /// the default order is `id_desc`.
    pub fn from_params(params: &Params, filter_specs: &[IndexFilter], config: &AdminConfig) -> Self {
        let page = positive_int(params.get("page")).unwrap_or(1);
        let per_page = positive_int(params.get("per_page"))
            .unwrap_or(config.per_page)
            .min(config.max_per_page);
        let order = params
            .get("order")
            .and_then(Value::as_str)
            .and_then(SortOrder::parse)
            .unwrap_or(SortOrder {
                field: "id".to_string(),
                descending: true,
            });
        let filters = params
            .get("q")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Self {
            page,
            per_page,
            order,
            filters,
            filter_specs: filter_specs.to_vec(),
        }
    }
}

fn positive_int(value: Option<&Value>) -> Option<usize> {
    let n = match value? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    usize::try_from(n).ok().filter(|n| *n > 0)
}

/// One page of index results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: Vec<Record>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_entries: usize,
    pub total_pages: usize,
}

impl Page {
    /// Slices an already filtered and sorted result set.
    pub fn paginate(records: Vec<Record>, page_number: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_entries = records.len();
        let total_pages = total_entries.div_ceil(page_size).max(1);
        let entries = records
            .into_iter()
            .skip((page_number.max(1) - 1) * page_size)
            .take(page_size)
            .collect();
        Self {
            entries,
            page_number: page_number.max(1),
            page_size,
            total_entries,
            total_pages,
        }
    }
}

/// Total order over JSON values used for sorting: null < bool < number < string.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The persistence contract.
#[async_trait]
pub trait Repo: Send + Sync {
    /// One filtered, sorted page of records.
    async fn index(&self, source: &str, query: &IndexQuery) -> Result<Page, RepoError>;

    /// A single record for the show or edit action.
    async fn fetch(&self, source: &str, kind: FetchKind, id: Id) -> Result<Record, RepoError>;

    /// Every record, in export order.
    async fn export(&self, source: &str) -> Result<Vec<Record>, RepoError>;

    /// Runs a change validator against an instance.
    fn validate_change(
        &self,
        changeset_fn: &dyn Fn(&Record, &Params) -> Changeset,
        instance: &Record,
        params: &Params,
    ) -> Changeset {
        changeset_fn(instance, params)
    }

    async fn insert(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError>;

    async fn update(&self, source: &str, changeset: Changeset) -> Result<Record, RepoError>;

    async fn delete(&self, source: &str, record: Record) -> Result<(), RepoError>;

    /// Direct lookup by primary key, used by the unchecked bulk path.
    async fn get(&self, source: &str, id: Id) -> Result<Option<Record>, RepoError>;
}
