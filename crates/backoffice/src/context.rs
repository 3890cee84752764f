//! # Request Context
//!
//! Per-request, single-owner state threaded through every pipeline stage by
//! exclusive reference. A context is created when a request arrives and dropped
//! once the response has been produced; it is never shared across requests.

use crate::changeset::ErrorMap;
use crate::model::Record;
use serde_json::{Map, Value};

/// Inbound parameters: a JSON object, possibly holding a sub-map keyed by route key.
pub type Params = Map<String, Value>;

/// Assign key read after the interceptor pipeline.
pub const AUTHORIZED_ASSIGN: &str = "authorized";

const CHARSET_SUFFIX: &str = "; charset=utf-8";

/// One-shot messages shown to the user after the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Flash {
    Notice(String),
    Error(String),
    /// Field-level errors from a rejected changeset.
    InlineErrors(ErrorMap),
}

/// Mutable per-request state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Path segments of the inbound request.
    pub path_info: Vec<String>,
    /// Parameters after scrubbing. Before-filters may rewrite them.
    pub params: Params,
    /// Free-form side channel shared by interceptors, hooks and handlers.
    pub assigns: Map<String, Value>,
    /// An instance already resolved by an authorization-scoped lookup.
    /// `show` and member actions use it instead of querying again.
    pub resource: Option<Record>,
    pub flash: Vec<Flash>,
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(path_info: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            path_info: path_info.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.assigns.insert(key.into(), value.into());
        self
    }

    pub fn get_assign(&self, key: &str) -> Option<&Value> {
        self.assigns.get(key)
    }

    /// The authorization verdict left by the interceptors, if any was set.
    ///
    /// Non-boolean values are treated as absent.
    pub fn authorized(&self) -> Option<bool> {
        self.assigns.get(AUTHORIZED_ASSIGN).and_then(Value::as_bool)
    }

    pub fn put_flash(&mut self, flash: Flash) {
        self.flash.push(flash);
    }

    /// The first notice set during the request.
    pub fn notice(&self) -> Option<&str> {
        self.flash.iter().find_map(|f| match f {
            Flash::Notice(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    pub fn put_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Sets a response header, replacing any header with the same (case-insensitive) name.
    pub fn put_resp_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn resp_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Injects `content-type: <mime>; charset=utf-8` unless a content type is already present.
    pub fn put_default_content_type(&mut self, mime: &str) {
        if self.resp_header("content-type").is_none() {
            self.headers
                .push(("content-type".to_string(), format!("{mime}{CHARSET_SUFFIX}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_authorized_assign() {
        let mut ctx = RequestContext::default();
        assert_eq!(ctx.authorized(), None);

        ctx.assign(AUTHORIZED_ASSIGN, false);
        assert_eq!(ctx.authorized(), Some(false));

        ctx.assign(AUTHORIZED_ASSIGN, json!("yes"));
        assert_eq!(ctx.authorized(), None);
    }

    #[test]
    fn test_default_content_type_keeps_existing() {
        let mut ctx = RequestContext::default();
        ctx.put_resp_header("Content-Type", "application/json");
        ctx.put_default_content_type("text/csv");
        assert_eq!(ctx.resp_header("content-type"), Some("application/json"));

        let mut fresh = RequestContext::default();
        fresh.put_default_content_type("text/csv");
        assert_eq!(fresh.resp_header("content-type"), Some("text/csv; charset=utf-8"));
    }
}
