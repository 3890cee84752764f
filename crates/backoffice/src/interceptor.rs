//! # Interceptor Pipeline
//!
//! Interceptors are plug-style stages that run before every action except the built-in
//! `nested` pseudo-action.
//! Each one receives the request context, the resource definition, the action name and
//! its own configuration options, and may mutate the context or halt the request.
//!
//! The effective list for a resource is the global defaults merged with the
//! resource's own entries:
//!
//! * an entry whose name matches a default replaces that default **in place**;
//! * any other entry is appended after the defaults, in registration order.
//!
//! After the last stage the pipeline reads the `authorized` assign. An explicit
//! `false` turns into [`DispatchError::Unauthorized`]; `true` or absent lets the
//! request through.

use crate::context::{RequestContext, AUTHORIZED_ASSIGN};
use crate::error::DispatchError;
use crate::resolver::ActionResolver;
use crate::resource::ResourceDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A named stage of the pipeline.
#[async_trait]
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;

    async fn call(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        action: &str,
        options: &Value,
    ) -> Result<(), DispatchError>;
}

/// An interceptor together with the options it was registered with.
#[derive(Clone)]
pub struct InterceptorEntry {
    pub interceptor: Arc<dyn Interceptor>,
    pub options: Value,
}

impl InterceptorEntry {
    pub fn new(interceptor: Arc<dyn Interceptor>, options: Value) -> Self {
        Self {
            interceptor,
            options,
        }
    }

    pub fn name(&self) -> &str {
        self.interceptor.name()
    }
}

impl fmt::Debug for InterceptorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorEntry")
            .field("name", &self.name())
            .field("options", &self.options)
            .finish()
    }
}

type InterceptFn = dyn Fn(&mut RequestContext, &ResourceDefinition, &str, &Value) -> Result<(), DispatchError>
    + Send
    + Sync;

/// An interceptor backed by a synchronous closure.
pub struct FnInterceptor {
    name: String,
    f: Box<InterceptFn>,
}

#[async_trait]
impl Interceptor for FnInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        action: &str,
        options: &Value,
    ) -> Result<(), DispatchError> {
        (self.f)(ctx, resource, action, options)
    }
}

/// Wraps a closure as a named interceptor.
pub fn interceptor_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Interceptor>
where
    F: Fn(&mut RequestContext, &ResourceDefinition, &str, &Value) -> Result<(), DispatchError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnInterceptor {
        name: name.into(),
        f: Box::new(f),
    })
}

/// An interceptor that stores the verdict of `predicate` in the `authorized` assign.
pub fn authorize<P>(name: impl Into<String>, predicate: P) -> Arc<dyn Interceptor>
where
    P: Fn(&RequestContext, &ResourceDefinition, &str) -> bool + Send + Sync + 'static,
{
    interceptor_fn(name, move |ctx, resource, action, _options| {
        let allowed = predicate(ctx, resource, action);
        ctx.assign(AUTHORIZED_ASSIGN, allowed);
        Ok(())
    })
}

/// Runs the effective interceptor list for a request.
#[derive(Clone, Default)]
pub struct InterceptorPipeline {
    defaults: Vec<InterceptorEntry>,
}

impl InterceptorPipeline {
    pub fn new(defaults: Vec<InterceptorEntry>) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &[InterceptorEntry] {
        &self.defaults
    }

    pub fn push_default(&mut self, entry: InterceptorEntry) {
        self.defaults.push(entry);
    }

    /// Defaults merged with the resource's own entries.
    pub fn effective(&self, resource: &ResourceDefinition) -> Vec<InterceptorEntry> {
        let mut merged = self.defaults.clone();
        for entry in resource.interceptors() {
            match merged.iter_mut().find(|e| e.name() == entry.name()) {
                Some(slot) => *slot = entry.clone(),
                None => merged.push(entry.clone()),
            }
        }
        merged
    }

    /// Runs every stage in order, then checks the authorization verdict.
    ///
    /// The built-in `nested` action bypasses the pipeline entirely; a custom action
    /// registered as `nested` does not.
    #[instrument(skip_all, fields(resource = resource.route_key(), action = action))]
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        action: &str,
        resource: &ResourceDefinition,
    ) -> Result<(), DispatchError> {
        if ActionResolver::is_builtin_nested(resource, action) {
            debug!("Skipping interceptors");
            return Ok(());
        }

        for entry in self.effective(resource) {
            debug!(interceptor = entry.name(), "Running");
            entry
                .interceptor
                .call(ctx, resource, action, &entry.options)
                .await?;
        }

        if ctx.authorized() == Some(false) {
            warn!("Not authorized");
            return Err(DispatchError::Unauthorized {
                resource: resource.route_key().to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for InterceptorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.defaults.iter().map(InterceptorEntry::name))
            .finish()
    }
}
