//! # Resource Definitions
//!
//! A [`ResourceDefinition`] describes one model exposed through the admin surface:
//! its route key, model reference, interceptors, before-filter, custom actions,
//! per-action changeset functions, index filters, menu priority and optional custom
//! views. Definitions are built once at startup with [`ResourceBuilder`] and are
//! immutable afterwards.
//!
//! ```rust
//! use backoffice::{ActionOutcome, ResourceDefinition, Schema};
//!
//! let widgets = ResourceDefinition::builder(
//!     "widgets",
//!     Schema::new("Widget", "widgets").required("name").field("price"),
//! )
//! .menu_priority(2)
//! .before_filter_only("stamp", ["create", "update"], |ctx, _params| {
//!     ctx.assign("stamped", true);
//!     Ok(())
//! })
//! .member_action("preview", |_ctx, record, _params| {
//!     Ok(ActionOutcome::Rendered {
//!         content: format!("preview of {}", record.label()),
//!         resource: Some(record.clone()),
//!     })
//! })
//! .build();
//!
//! assert_eq!(widgets.route_key(), "widgets");
//! assert!(widgets.member_actions().contains_key("preview"));
//! ```

use crate::before_filter::{BeforeFilter, BeforeFilterHook, FilterScope};
use crate::changeset::{Changeset, ChangesetFn};
use crate::context::{Params, RequestContext};
use crate::error::DispatchError;
use crate::interceptor::{Interceptor, InterceptorEntry};
use crate::layout::{AjaxView, Content, FormBlock, FormInput, FormView, IndexView, ShowView};
use crate::model::{Model, Record};
use crate::outcome::ActionOutcome;
use crate::repo::{IndexFilter, Page};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A custom action operating on one resolved instance.
#[async_trait]
pub trait MemberAction: Send + Sync {
    async fn call(
        &self,
        ctx: &mut RequestContext,
        record: Record,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError>;
}

#[async_trait]
impl<F> MemberAction for F
where
    F: Fn(&mut RequestContext, &Record, &Params) -> Result<ActionOutcome, DispatchError>
        + Send
        + Sync,
{
    async fn call(
        &self,
        ctx: &mut RequestContext,
        record: Record,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        self(ctx, &record, params)
    }
}

/// A custom action operating on the resource as a whole.
#[async_trait]
pub trait CollectionAction: Send + Sync {
    async fn call(
        &self,
        ctx: &mut RequestContext,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError>;
}

#[async_trait]
impl<F> CollectionAction for F
where
    F: Fn(&mut RequestContext, &Params) -> Result<ActionOutcome, DispatchError> + Send + Sync,
{
    async fn call(
        &self,
        ctx: &mut RequestContext,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        self(ctx, params)
    }
}

/// Produces the form layout blocks searched by nested field resolution.
pub type FormBlocksFn = Arc<dyn Fn(&RequestContext) -> Vec<FormBlock> + Send + Sync>;

/// Optional per-resource renderers. An absent view falls back to the layout default.
#[derive(Clone, Default)]
pub struct ResourceViews {
    pub index: Option<IndexView>,
    pub show: Option<ShowView>,
    pub form: Option<FormView>,
    pub ajax: Option<AjaxView>,
}

impl ResourceViews {
    pub fn index(&self) -> Option<&IndexView> {
        self.index.as_ref()
    }

    pub fn show(&self) -> Option<&ShowView> {
        self.show.as_ref()
    }

    pub fn form(&self) -> Option<&FormView> {
        self.form.as_ref()
    }

    pub fn ajax(&self) -> Option<&AjaxView> {
        self.ajax.as_ref()
    }
}

/// Everything the dispatcher knows about one registered resource.
pub struct ResourceDefinition {
    route_key: String,
    model: Arc<dyn Model>,
    interceptors: Vec<InterceptorEntry>,
    before_filter: Option<BeforeFilter>,
    member_actions: HashMap<String, Arc<dyn MemberAction>>,
    collection_actions: HashMap<String, Arc<dyn CollectionAction>>,
    changeset_fns: HashMap<String, ChangesetFn>,
    index_filters: Vec<IndexFilter>,
    menu_priority: i32,
    views: ResourceViews,
    form_blocks: Option<FormBlocksFn>,
}

impl ResourceDefinition {
    pub fn builder(route_key: impl Into<String>, model: impl Model) -> ResourceBuilder {
        ResourceBuilder::new(route_key, Arc::new(model))
    }

    pub fn route_key(&self) -> &str {
        &self.route_key
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub fn interceptors(&self) -> &[InterceptorEntry] {
        &self.interceptors
    }

    pub fn before_filter(&self) -> Option<&BeforeFilter> {
        self.before_filter.as_ref()
    }

    pub fn member_actions(&self) -> &HashMap<String, Arc<dyn MemberAction>> {
        &self.member_actions
    }

    pub fn collection_actions(&self) -> &HashMap<String, Arc<dyn CollectionAction>> {
        &self.collection_actions
    }

    /// The changeset function registered for `action`, if any.
    pub fn changeset_fn(&self, action: &str) -> Option<&ChangesetFn> {
        self.changeset_fns.get(action)
    }

    pub fn index_filters(&self) -> &[IndexFilter] {
        &self.index_filters
    }

    pub fn menu_priority(&self) -> i32 {
        self.menu_priority
    }

    pub fn views(&self) -> &ResourceViews {
        &self.views
    }

    /// The current form layout blocks; empty when the resource declares none.
    pub fn form_blocks(&self, ctx: &RequestContext) -> Vec<FormBlock> {
        self.form_blocks
            .as_ref()
            .map(|blocks| blocks(ctx))
            .unwrap_or_default()
    }

    /// Searches the form blocks in order, then each block's inputs in order;
    /// the first input with a matching name wins.
    pub fn find_input(&self, ctx: &RequestContext, field: &str) -> Option<FormInput> {
        self.form_blocks(ctx)
            .into_iter()
            .flat_map(|block| block.inputs)
            .find(|input| input.name == field)
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("route_key", &self.route_key)
            .field("model", &self.model.name())
            .field(
                "interceptors",
                &self
                    .interceptors
                    .iter()
                    .map(|e| e.interceptor.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("before_filter", &self.before_filter.as_ref().map(|b| &b.name))
            .field("member_actions", &self.member_actions.keys().collect::<Vec<_>>())
            .field(
                "collection_actions",
                &self.collection_actions.keys().collect::<Vec<_>>(),
            )
            .field("menu_priority", &self.menu_priority)
            .finish()
    }
}

/// Registration API for a [`ResourceDefinition`].
pub struct ResourceBuilder {
    def: ResourceDefinition,
}

impl ResourceBuilder {
    fn new(route_key: impl Into<String>, model: Arc<dyn Model>) -> Self {
        Self {
            def: ResourceDefinition {
                route_key: route_key.into(),
                model,
                interceptors: Vec::new(),
                before_filter: None,
                member_actions: HashMap::new(),
                collection_actions: HashMap::new(),
                changeset_fns: HashMap::new(),
                index_filters: Vec::new(),
                menu_priority: 0,
                views: ResourceViews::default(),
                form_blocks: None,
            },
        }
    }

    /// Adds (or overrides, by name) an interceptor for this resource.
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>, options: Value) -> Self {
        self.def.interceptors.push(InterceptorEntry {
            interceptor,
            options,
        });
        self
    }

    pub fn before_filter(mut self, filter: BeforeFilter) -> Self {
        self.def.before_filter = Some(filter);
        self
    }

    /// A before-filter running for every action.
    pub fn before_filter_always<H>(self, name: impl Into<String>, hook: H) -> Self
    where
        H: Fn(&mut RequestContext, &Params) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.before_filter(BeforeFilter::new(name, Arc::new(hook), FilterScope::Always))
    }

    /// A before-filter running only for the listed actions.
    pub fn before_filter_only<H, A, S>(self, name: impl Into<String>, actions: A, hook: H) -> Self
    where
        H: Fn(&mut RequestContext, &Params) -> Result<(), DispatchError> + Send + Sync + 'static,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before_filter(BeforeFilter::new(
            name,
            Arc::new(hook),
            FilterScope::only(actions),
        ))
    }

    /// A before-filter running for every action except the listed ones.
    pub fn before_filter_except<H, A, S>(self, name: impl Into<String>, actions: A, hook: H) -> Self
    where
        H: Fn(&mut RequestContext, &Params) -> Result<(), DispatchError> + Send + Sync + 'static,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before_filter(BeforeFilter::new(
            name,
            Arc::new(hook),
            FilterScope::except(actions),
        ))
    }

    /// A before-filter backed by a custom (possibly async) hook.
    pub fn before_filter_hook(
        self,
        name: impl Into<String>,
        scope: FilterScope,
        hook: Arc<dyn BeforeFilterHook>,
    ) -> Self {
        self.before_filter(BeforeFilter::new(name, hook, scope))
    }

    pub fn member_action<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut RequestContext, &Record, &Params) -> Result<ActionOutcome, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.member_handler(name, Arc::new(action))
    }

    pub fn member_handler(mut self, name: impl Into<String>, action: Arc<dyn MemberAction>) -> Self {
        self.def.member_actions.insert(name.into(), action);
        self
    }

    pub fn collection_action<F>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut RequestContext, &Params) -> Result<ActionOutcome, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.collection_handler(name, Arc::new(action))
    }

    pub fn collection_handler(
        mut self,
        name: impl Into<String>,
        action: Arc<dyn CollectionAction>,
    ) -> Self {
        self.def.collection_actions.insert(name.into(), action);
        self
    }

    /// Overrides the model's default validator for `action` (`create` or `update`).
    pub fn changeset_fn<F>(mut self, action: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Record, &Params) -> Changeset + Send + Sync + 'static,
    {
        self.def.changeset_fns.insert(action.into(), Arc::new(f));
        self
    }

    pub fn index_filter(mut self, filter: IndexFilter) -> Self {
        self.def.index_filters.push(filter);
        self
    }

    pub fn menu_priority(mut self, priority: i32) -> Self {
        self.def.menu_priority = priority;
        self
    }

    pub fn index_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&RequestContext, &Page) -> Content + Send + Sync + 'static,
    {
        self.def.views.index = Some(Arc::new(view));
        self
    }

    pub fn show_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&RequestContext, &Record) -> Content + Send + Sync + 'static,
    {
        self.def.views.show = Some(Arc::new(view));
        self
    }

    pub fn form_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&RequestContext, &Record, &Params) -> Content + Send + Sync + 'static,
    {
        self.def.views.form = Some(Arc::new(view));
        self
    }

    pub fn ajax_view<F>(mut self, view: F) -> Self
    where
        F: Fn(&RequestContext, &Params, &[Record], &FormInput) -> Content + Send + Sync + 'static,
    {
        self.def.views.ajax = Some(Arc::new(view));
        self
    }

    pub fn form_blocks<F>(mut self, blocks: F) -> Self
    where
        F: Fn(&RequestContext) -> Vec<FormBlock> + Send + Sync + 'static,
    {
        self.def.form_blocks = Some(Arc::new(blocks));
        self
    }

    pub fn build(self) -> ResourceDefinition {
        self.def
    }
}
