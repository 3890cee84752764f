//! # Dispatcher
//!
//! The entry point of the dispatch core. For every request it:
//!
//! 1. resolves the resource definition (by key, or the default resource);
//! 2. scrubs the params into `ctx.params`;
//! 3. runs the interceptor pipeline;
//! 4. runs the before-filter gate;
//! 5. resolves the action and executes the custom or built-in handler.
//!
//! Every stage returns `Result`; the first error aborts the request.
//! [`Dispatcher::handle`] turns the final result into an [`AdminResponse`].
//!
//! The dispatcher holds only shared, read-only state and can be cloned into as many
//! request tasks as needed.

use crate::before_filter::BeforeFilterGate;
use crate::config::AdminConfig;
use crate::context::{Params, RequestContext};
use crate::crud::CrudActionSet;
use crate::error::DispatchError;
use crate::interceptor::{Interceptor, InterceptorEntry, InterceptorPipeline};
use crate::layout::{Layout, PlainLayout};
use crate::outcome::{ActionOutcome, AdminResponse};
use crate::registry::ResourceRegistry;
use crate::repo::Repo;
use crate::resolver::{ActionResolver, Handler};
use crate::scrub::ParamScrubber;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// An inbound request: an optional resource key, an action name and the raw params.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRequest {
    /// `None` dispatches to the default resource.
    pub resource: Option<String>,
    pub action: String,
    pub params: Params,
}

impl AdminRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            resource: None,
            action: action.into(),
            params: Params::new(),
        }
    }

    pub fn resource(mut self, route_key: impl Into<String>) -> Self {
        self.resource = Some(route_key.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ResourceRegistry>,
    repo: Arc<dyn Repo>,
    layout: Arc<dyn Layout>,
    pipeline: InterceptorPipeline,
    config: AdminConfig,
}

impl Dispatcher {
    pub fn builder(registry: impl Into<Arc<ResourceRegistry>>, repo: Arc<dyn Repo>) -> DispatcherBuilder {
        DispatcherBuilder {
            registry: registry.into(),
            repo,
            layout: Arc::new(PlainLayout),
            pipeline: InterceptorPipeline::default(),
            config: AdminConfig::default(),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Runs a request through every stage and returns the handler's outcome.
    #[instrument(
        skip(self, ctx, request),
        fields(resource = ?request.resource, action = %request.action)
    )]
    pub async fn dispatch(
        &self,
        ctx: &mut RequestContext,
        request: AdminRequest,
    ) -> Result<ActionOutcome, DispatchError> {
        let AdminRequest {
            resource,
            action,
            params,
        } = request;

        let resource = match resource {
            Some(key) => self
                .registry
                .lookup(&key)
                .ok_or(DispatchError::UnknownResource(key))?,
            None => self
                .registry
                .default_resource()
                .ok_or_else(|| DispatchError::UnknownResource(String::new()))?,
        };
        debug!(route_key = resource.route_key(), "Resource resolved");

        ctx.params = ParamScrubber::scrub(params, resource.route_key(), &action);
        self.pipeline.run(ctx, &action, resource).await?;
        BeforeFilterGate::run(ctx, &action, resource).await?;

        let params = ctx.params.clone();
        let handler = ActionResolver::resolve(resource, &action, &params)?;
        debug!(?handler, "Handler resolved");

        let crud = CrudActionSet::new(self.repo.as_ref(), self.layout.as_ref(), &self.config);
        match handler {
            Handler::Member(member) => {
                let record = crud.resolve_instance(ctx, resource, &params).await?;
                member.call(ctx, record, &params).await
            }
            Handler::Collection(collection) => collection.call(ctx, &params).await,
            Handler::Builtin(builtin) => crud.execute(builtin, ctx, resource, &params).await,
        }
    }

    /// Dispatches and renders the result into a response.
    ///
    /// Status defaults to 200 (302 for redirects) unless a stage already set one.
    /// Fatal errors become a plain-text error response with the status from
    /// [`DispatchError::status`].
    pub async fn handle(&self, ctx: &mut RequestContext, request: AdminRequest) -> AdminResponse {
        match self.dispatch(ctx, request).await {
            Ok(outcome) => {
                let body = match &outcome {
                    ActionOutcome::Redirected { location } => {
                        ctx.put_resp_header("location", location.clone());
                        if ctx.status.is_none() {
                            ctx.put_status(302);
                        }
                        String::new()
                    }
                    ActionOutcome::Rendered { content, .. }
                    | ActionOutcome::ValidationFailed { content, .. } => {
                        ctx.put_default_content_type("text/html");
                        content.clone()
                    }
                };
                let status = ctx.status.unwrap_or(200);
                info!(status, "Request handled");
                AdminResponse {
                    status,
                    headers: ctx.headers.clone(),
                    body,
                    flash: ctx.flash.clone(),
                    outcome: Some(outcome),
                }
            }
            Err(err) => {
                let status = err.status();
                warn!(status, error = %err, "Request failed");
                AdminResponse {
                    status,
                    headers: vec![(
                        "content-type".to_string(),
                        "text/plain; charset=utf-8".to_string(),
                    )],
                    body: reason_phrase(status).to_string(),
                    flash: ctx.flash.clone(),
                    outcome: None,
                }
            }
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}

pub struct DispatcherBuilder {
    registry: Arc<ResourceRegistry>,
    repo: Arc<dyn Repo>,
    layout: Arc<dyn Layout>,
    pipeline: InterceptorPipeline,
    config: AdminConfig,
}

impl DispatcherBuilder {
    /// Appends an interceptor to the process-wide default list.
    pub fn default_interceptor(mut self, interceptor: Arc<dyn Interceptor>, options: Value) -> Self {
        self.pipeline
            .push_default(InterceptorEntry::new(interceptor, options));
        self
    }

    pub fn layout(mut self, layout: Arc<dyn Layout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(mut self, config: AdminConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Dispatcher {
        info!(
            resources = self.registry.len(),
            default_interceptors = self.pipeline.defaults().len(),
            base_path = %self.config.base_path,
            "Dispatcher ready"
        );
        Dispatcher {
            registry: self.registry,
            repo: self.repo,
            layout: self.layout,
            pipeline: self.pipeline,
            config: self.config,
        }
    }
}
