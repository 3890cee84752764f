//! # Configuration
//!
//! Dispatch settings, deserializable from any serde source and overridable from the
//! environment:
//!
//! - `BACKOFFICE_BASE_PATH` - mount point of the admin surface (default `/admin`)
//! - `BACKOFFICE_PER_PAGE` - default index page size (default 20)

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub base_path: String,
    pub per_page: usize,
    pub max_per_page: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_path: "/admin".to_string(),
            per_page: 20,
            max_per_page: 200,
        }
    }
}

impl AdminConfig {
    /// Defaults overridden by `BACKOFFICE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup("BACKOFFICE_BASE_PATH") {
            self.base_path = base;
        }
        if let Some(raw) = lookup("BACKOFFICE_PER_PAGE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.per_page = n.min(self.max_per_page),
                _ => warn!(value = %raw, "Ignoring invalid BACKOFFICE_PER_PAGE"),
            }
        }
        self
    }

    fn base(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    /// `<base>/<route_key>`
    pub fn index_path(&self, route_key: &str) -> String {
        format!("{}/{}", self.base(), route_key)
    }

    /// `<base>/<route_key>/<id>`
    pub fn show_path(&self, route_key: &str, id: impl std::fmt::Display) -> String {
        format!("{}/{}/{}", self.base(), route_key, id)
    }
}
