//! # Layout & Render Contract
//!
//! Rendering is delegated. The dispatch core calls a [`Layout`] for the default index,
//! show and form views, the nested-field AJAX fragment and CSV export; a resource may
//! register its own view for any of these (see [`ResourceViews`](crate::ResourceViews)).
//!
//! [`PlainLayout`] is a small text renderer good enough for tests, demos and
//! machine consumers.

use crate::context::{Flash, Params, RequestContext};
use crate::error::DispatchError;
use crate::model::Record;
use crate::repo::Page;
use crate::resource::ResourceDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Rendered output handed to the host's response writer.
pub type Content = String;

pub type IndexView = Arc<dyn Fn(&RequestContext, &Page) -> Content + Send + Sync>;
pub type ShowView = Arc<dyn Fn(&RequestContext, &Record) -> Content + Send + Sync>;
pub type FormView = Arc<dyn Fn(&RequestContext, &Record, &Params) -> Content + Send + Sync>;
pub type AjaxView =
    Arc<dyn Fn(&RequestContext, &Params, &[Record], &FormInput) -> Content + Send + Sync>;

/// Loads the candidate association targets of a form input.
#[async_trait]
pub trait CollectionLoader: Send + Sync {
    async fn load(&self, ctx: &RequestContext, params: &Params) -> Result<Vec<Record>, DispatchError>;
}

#[async_trait]
impl<F> CollectionLoader for F
where
    F: Fn(&RequestContext, &Params) -> Vec<Record> + Send + Sync,
{
    async fn load(&self, ctx: &RequestContext, params: &Params) -> Result<Vec<Record>, DispatchError> {
        Ok(self(ctx, params))
    }
}

/// One input of a form layout block.
#[derive(Clone)]
pub struct FormInput {
    pub name: String,
    pub label: Option<String>,
    pub collection: Option<Arc<dyn CollectionLoader>>,
}

impl FormInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            collection: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn collection<F>(self, loader: F) -> Self
    where
        F: Fn(&RequestContext, &Params) -> Vec<Record> + Send + Sync + 'static,
    {
        self.loader(Arc::new(loader))
    }

    pub fn loader(mut self, loader: Arc<dyn CollectionLoader>) -> Self {
        self.collection = Some(loader);
        self
    }
}

impl fmt::Debug for FormInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormInput")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("collection", &self.collection.is_some())
            .finish()
    }
}

/// A titled group of inputs, as produced by a resource's form layout.
#[derive(Debug, Clone)]
pub struct FormBlock {
    pub name: String,
    pub inputs: Vec<FormInput>,
}

impl FormBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
        }
    }

    pub fn input(mut self, input: FormInput) -> Self {
        self.inputs.push(input);
        self
    }
}

/// Default renderers used when a resource supplies none of its own.
pub trait Layout: Send + Sync {
    fn index_view(&self, ctx: &RequestContext, resource: &ResourceDefinition, page: &Page) -> Content;

    fn show_view(&self, ctx: &RequestContext, resource: &ResourceDefinition, record: &Record) -> Content;

    fn form_view(
        &self,
        ctx: &RequestContext,
        resource: &ResourceDefinition,
        record: &Record,
        params: &Params,
    ) -> Content;

    fn ajax_view(
        &self,
        ctx: &RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
        records: &[Record],
        input: &FormInput,
    ) -> Content;

    fn build_csv(
        &self,
        resource: &ResourceDefinition,
        first: &Record,
        rest: &[Record],
    ) -> Result<Content, DispatchError>;
}

/// Plain-text layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLayout;

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Escapes text placed inside HTML markup or a quoted attribute.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn export_error(err: impl fmt::Display) -> DispatchError {
    DispatchError::Export(err.to_string())
}

impl Layout for PlainLayout {
    fn index_view(&self, _ctx: &RequestContext, resource: &ResourceDefinition, page: &Page) -> Content {
        let model = resource.model();
        let mut out = format!(
            "{} (page {} of {}, {} total)\n",
            model.plural(),
            page.page_number,
            page.total_pages,
            page.total_entries
        );
        for record in &page.entries {
            let fields: Vec<String> = record
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={}", display(v)))
                .collect();
            out.push_str(&format!(
                "#{} {}\n",
                record.id.map(|id| id.to_string()).unwrap_or_default(),
                fields.join(" ")
            ));
        }
        out
    }

    fn show_view(&self, _ctx: &RequestContext, resource: &ResourceDefinition, record: &Record) -> Content {
        let mut out = format!("{} {}\n", resource.model().name(), record.label());
        for (key, value) in &record.fields {
            out.push_str(&format!("{key}: {}\n", display(value)));
        }
        out
    }

    fn form_view(
        &self,
        ctx: &RequestContext,
        resource: &ResourceDefinition,
        record: &Record,
        _params: &Params,
    ) -> Content {
        let key = resource.route_key();
        let title = match record.id {
            Some(id) => format!("Edit {} #{id}", resource.model().name()),
            None => format!("New {}", resource.model().name()),
        };
        let mut out = format!("{title}\n");
        for flash in &ctx.flash {
            if let Flash::InlineErrors(errors) = flash {
                for (field, messages) in errors {
                    out.push_str(&format!("! {field} {}\n", messages.join(", ")));
                }
            }
        }
        for (field, value) in &record.fields {
            out.push_str(&format!("{key}[{field}] = {}\n", Value::String(display(value))));
        }
        out
    }

    fn ajax_view(
        &self,
        _ctx: &RequestContext,
        resource: &ResourceDefinition,
        _params: &Params,
        records: &[Record],
        input: &FormInput,
    ) -> Content {
        let options: String = records
            .iter()
            .map(|r| {
                format!(
                    "<option value='{}'>{}</option>",
                    escape_html(&r.id.map(|id| id.to_string()).unwrap_or_default()),
                    escape_html(&r.label())
                )
            })
            .collect();
        format!(
            "$('#{}_{}').html({});",
            resource.route_key(),
            input.name,
            Value::String(options)
        )
    }

    fn build_csv(
        &self,
        _resource: &ResourceDefinition,
        first: &Record,
        rest: &[Record],
    ) -> Result<Content, DispatchError> {
        // Columns come from the first record; later records may carry extra keys.
        let mut columns: Vec<String> = first.fields.keys().cloned().collect();
        for record in rest {
            for key in record.fields.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer
            .write_record(std::iter::once("id").chain(columns.iter().map(String::as_str)))
            .map_err(export_error)?;

        for record in std::iter::once(first).chain(rest) {
            let id = record.id.map(|id| id.to_string()).unwrap_or_default();
            let cells = columns
                .iter()
                .map(|column| record.get(column).map(display).unwrap_or_default());
            writer
                .write_record(std::iter::once(id).chain(cells))
                .map_err(export_error)?;
        }

        let bytes = writer.into_inner().map_err(export_error)?;
        String::from_utf8(bytes).map_err(export_error)
    }
}
