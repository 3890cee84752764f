//! # Before-Filter Gate
//!
//! A resource may declare at most one before-filter: a named hook plus a scope saying
//! which actions it runs for. The hook receives the context and a snapshot of the
//! current params, and may rewrite `ctx.params` or halt the request with an error.

use crate::context::{Params, RequestContext};
use crate::error::DispatchError;
use crate::resource::ResourceDefinition;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which actions a before-filter applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterScope {
    #[default]
    Always,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl FilterScope {
    pub fn only<A, S>(actions: A) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterScope::Only(actions.into_iter().map(Into::into).collect())
    }

    pub fn except<A, S>(actions: A) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterScope::Except(actions.into_iter().map(Into::into).collect())
    }

    pub fn applies_to(&self, action: &str) -> bool {
        match self {
            FilterScope::Always => true,
            FilterScope::Only(actions) => actions.contains(action),
            FilterScope::Except(actions) => !actions.contains(action),
        }
    }
}

/// The callable part of a before-filter.
#[async_trait]
pub trait BeforeFilterHook: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext, params: &Params) -> Result<(), DispatchError>;
}

#[async_trait]
impl<F> BeforeFilterHook for F
where
    F: Fn(&mut RequestContext, &Params) -> Result<(), DispatchError> + Send + Sync,
{
    async fn call(&self, ctx: &mut RequestContext, params: &Params) -> Result<(), DispatchError> {
        self(ctx, params)
    }
}

#[derive(Clone)]
pub struct BeforeFilter {
    pub name: String,
    pub hook: Arc<dyn BeforeFilterHook>,
    pub scope: FilterScope,
}

impl BeforeFilter {
    pub fn new(name: impl Into<String>, hook: Arc<dyn BeforeFilterHook>, scope: FilterScope) -> Self {
        Self {
            name: name.into(),
            hook,
            scope,
        }
    }
}

impl fmt::Debug for BeforeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeforeFilter")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Runs a resource's before-filter when its scope covers the action.
pub struct BeforeFilterGate;

impl BeforeFilterGate {
    #[instrument(skip_all, fields(resource = resource.route_key(), action = action))]
    pub async fn run(
        ctx: &mut RequestContext,
        action: &str,
        resource: &ResourceDefinition,
    ) -> Result<(), DispatchError> {
        let Some(filter) = resource.before_filter() else {
            return Ok(());
        };
        if !filter.scope.applies_to(action) {
            debug!(filter = %filter.name, "Out of scope");
            return Ok(());
        }

        debug!(filter = %filter.name, "Running before-filter");
        let params = ctx.params.clone();
        filter.hook.call(ctx, &params).await
    }
}
