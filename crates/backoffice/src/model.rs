//! # Models & Records
//!
//! The dispatch core never knows the concrete shape of a host model. Instances travel
//! as [`Record`]s (an optional integer id plus a JSON field map) and the model itself is
//! referenced through the [`Model`] trait: naming, storage source, blank instances and
//! the default change validator.
//!
//! [`Schema`] is a declarative [`Model`] for the common case of "these fields are
//! permitted, these are required".

use crate::changeset::Changeset;
use crate::context::Params;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Primary key of a persisted record.
pub type Id = u64;

/// A model instance as seen by the dispatch core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// `None` until the record has been inserted.
    pub id: Option<Id>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Id) -> Self {
        Self {
            id: Some(id),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// A short human label: the `name` or `title` field, else `#<id>`.
    pub fn label(&self) -> String {
        ["name", "title"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| match self.id {
                Some(id) => format!("#{id}"),
                None => "#new".to_string(),
            })
    }
}

/// Opaque reference to the data type behind a registered resource.
pub trait Model: Send + Sync + 'static {
    /// Singular display name, e.g. `Widget`.
    fn name(&self) -> &str;

    /// Lower-case singular noun used in notices, e.g. `blog post`.
    fn singular(&self) -> String {
        humanize(self.name())
    }

    /// Lower-case plural noun used in notices, e.g. `blog posts`.
    fn plural(&self) -> String {
        pluralize(&self.singular())
    }

    /// Name of the storage source (table, collection, actor) holding the instances.
    fn source(&self) -> &str;

    /// A fresh, unsaved instance.
    fn blank(&self) -> Record {
        Record::default()
    }

    /// The model's own validator, used when a resource registers no override.
    fn default_changeset(&self, record: &Record, params: &Params) -> Changeset;
}

/// Declarative model: permitted fields, required fields and blank defaults.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    plural: Option<String>,
    source: String,
    fields: Vec<String>,
    required: Vec<String>,
    defaults: Map<String, Value>,
}

impl Schema {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural: None,
            source: source.into(),
            fields: Vec::new(),
            required: Vec::new(),
            defaults: Map::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// A permitted field that must be present and non-blank.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.fields.push(name.clone());
        self.required.push(name);
        self
    }

    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Overrides the naive plural (`person` -> `people`).
    pub fn plural_noun(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Model for Schema {
    fn name(&self) -> &str {
        &self.name
    }

    fn plural(&self) -> String {
        self.plural
            .clone()
            .unwrap_or_else(|| pluralize(&humanize(&self.name)))
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn blank(&self) -> Record {
        Record {
            id: None,
            fields: self.defaults.clone(),
        }
    }

    fn default_changeset(&self, record: &Record, params: &Params) -> Changeset {
        Changeset::new(record.clone())
            .cast(params, &self.fields)
            .validate_required(&self.required)
    }
}

/// Splits a type-style name into lower-case words: `BlogPost` and `blog_post`
/// both become `blog post`.
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c == '_' || c == '-' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
        } else {
            let boundary = c.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            if boundary && !out.ends_with(' ') {
                out.push(' ');
            }
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }
    out.trim_end().to_string()
}

/// English plural for the simple cases.
pub fn pluralize(noun: &str) -> String {
    let consonant_y = noun.ends_with('y')
        && !noun.ends_with("ay")
        && !noun.ends_with("ey")
        && !noun.ends_with("oy")
        && !noun.ends_with("uy");
    if consonant_y {
        format!("{}ies", &noun[..noun.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| noun.ends_with(s)) {
        format!("{noun}es")
    } else {
        format!("{noun}s")
    }
}
