//! # Built-in CRUD Actions
//!
//! Stateless handlers for the built-in action vocabulary. Each one is parameterized by
//! the request context, the resource definition and the params, and returns an
//! [`ActionOutcome`].
//!
//! `create` and `update` follow the same state machine:
//!
//! ```text
//! fetch/build instance -> validate changeset -+-> valid   -> persist -> notice -> Redirected(show)
//!                                             +-> invalid -> inline errors -> re-render form -> ValidationFailed
//! ```
//!
//! An invalid changeset never reaches the repo's `insert`/`update`.

use crate::changeset::{ChangesetValidator, ErrorMap, Validation};
use crate::config::AdminConfig;
use crate::context::{Flash, Params, RequestContext};
use crate::error::{DispatchError, RepoError};
use crate::layout::Layout;
use crate::model::{Id, Record};
use crate::outcome::ActionOutcome;
use crate::repo::{FetchKind, IndexQuery, Repo};
use crate::resolver::BuiltinAction;
use crate::resource::ResourceDefinition;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub const INVALID_NOTICE: &str = "Please correct the errors below.";

/// Param holding the ids selected for a batch action.
pub const SELECTION_PARAM: &str = "collection_selection";

/// Param naming the field whose collection a nested request resolves.
pub const FIELD_NAME_PARAM: &str = "field_name";

/// Parses an `id` param. Numbers and numeric strings are accepted.
pub fn parse_id(value: Option<&Value>) -> Result<Id, DispatchError> {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| DispatchError::InvalidId(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<Id>()
            .map_err(|_| DispatchError::InvalidId(s.clone())),
        Some(other) => Err(DispatchError::InvalidId(other.to_string())),
        None => Err(DispatchError::InvalidId(String::new())),
    }
}

/// The built-in handlers, bound to the collaborators they call into.
pub struct CrudActionSet<'a> {
    repo: &'a dyn Repo,
    layout: &'a dyn Layout,
    config: &'a AdminConfig,
}

impl<'a> CrudActionSet<'a> {
    pub fn new(repo: &'a dyn Repo, layout: &'a dyn Layout, config: &'a AdminConfig) -> Self {
        Self {
            repo,
            layout,
            config,
        }
    }

    #[instrument(skip_all, fields(resource = resource.route_key(), action = action.name()))]
    pub async fn execute(
        &self,
        action: BuiltinAction,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        match action {
            BuiltinAction::Index => self.index(ctx, resource, params).await,
            BuiltinAction::Show => self.show(ctx, resource, params).await,
            BuiltinAction::New => Ok(self.new_form(ctx, resource, params)),
            BuiltinAction::Edit => self.edit(ctx, resource, params).await,
            BuiltinAction::Create => self.create(ctx, resource, params).await,
            BuiltinAction::Update => self.update(ctx, resource, params).await,
            BuiltinAction::Destroy => self.destroy(ctx, resource, params).await,
            BuiltinAction::BatchDestroy => self.batch_destroy(ctx, resource, params).await,
            BuiltinAction::Csv => self.csv(ctx, resource).await,
            BuiltinAction::Nested => self.nested(ctx, resource, params).await,
        }
    }

    /// The instance a show or member action operates on: the one already resolved
    /// into `ctx.resource` if present, otherwise a `show` fetch by `params["id"]`.
    pub async fn resolve_instance(
        &self,
        ctx: &RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<Record, DispatchError> {
        if let Some(record) = &ctx.resource {
            debug!("Reusing pre-resolved instance");
            return Ok(record.clone());
        }
        let id = parse_id(params.get("id"))?;
        Ok(self
            .repo
            .fetch(resource.model().source(), FetchKind::Show, id)
            .await?)
    }

    async fn index(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let query = IndexQuery::from_params(params, resource.index_filters(), self.config);
        debug!(?query, "Index query");
        let page = self.repo.index(resource.model().source(), &query).await?;

        let content = match resource.views().index() {
            Some(view) => view(ctx, &page),
            None => self.layout.index_view(ctx, resource, &page),
        };
        Ok(ActionOutcome::Rendered {
            content,
            resource: None,
        })
    }

    async fn show(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let record = self.resolve_instance(ctx, resource, params).await?;
        let content = match resource.views().show() {
            Some(view) => view(ctx, &record),
            None => self.layout.show_view(ctx, resource, &record),
        };
        Ok(ActionOutcome::Rendered {
            content,
            resource: Some(record),
        })
    }

    fn new_form(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> ActionOutcome {
        let record = resource.model().blank();
        ActionOutcome::Rendered {
            content: self.render_form(ctx, resource, &record, params),
            resource: Some(record),
        }
    }

    async fn edit(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let id = parse_id(params.get("id"))?;
        let record = self
            .repo
            .fetch(resource.model().source(), FetchKind::Edit, id)
            .await?;
        Ok(ActionOutcome::Rendered {
            content: self.render_form(ctx, resource, &record, params),
            resource: Some(record),
        })
    }

    async fn create(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let model = resource.model();
        let instance = model.blank();
        let fields = field_params(resource, params);

        match ChangesetValidator::validate(self.repo, resource, "create", &instance, &fields) {
            Validation::Valid(changeset) => {
                let record = self.repo.insert(model.source(), changeset).await?;
                let id = record.id.ok_or_else(|| {
                    RepoError::Backend(format!("insert into {} returned no id", model.source()))
                })?;
                info!(%id, "Created");
                ctx.put_flash(Flash::Notice(format!("{} was successfully created.", model.name())));
                Ok(ActionOutcome::redirect(
                    self.config.show_path(resource.route_key(), id),
                ))
            }
            Validation::Invalid { errors, candidate } => {
                Ok(self.reject(ctx, resource, &candidate, errors, params))
            }
        }
    }

    async fn update(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let model = resource.model();
        let id = parse_id(params.get("id"))?;
        let instance = self.repo.fetch(model.source(), FetchKind::Edit, id).await?;
        let fields = field_params(resource, params);

        match ChangesetValidator::validate(self.repo, resource, "update", &instance, &fields) {
            Validation::Valid(changeset) => {
                let record = self.repo.update(model.source(), changeset).await?;
                let id = record.id.unwrap_or(id);
                info!(%id, "Updated");
                ctx.put_flash(Flash::Notice(format!("{} was successfully updated.", model.name())));
                Ok(ActionOutcome::redirect(
                    self.config.show_path(resource.route_key(), id),
                ))
            }
            Validation::Invalid { errors, candidate } => {
                Ok(self.reject(ctx, resource, &candidate, errors, params))
            }
        }
    }

    async fn destroy(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let model = resource.model();
        let id = parse_id(params.get("id"))?;
        let record = self.repo.fetch(model.source(), FetchKind::Edit, id).await?;
        self.repo.delete(model.source(), record).await?;

        info!(%id, "Destroyed");
        ctx.put_flash(Flash::Notice(format!("{} was successfully destroyed.", model.name())));
        Ok(ActionOutcome::redirect(
            self.config.index_path(resource.route_key()),
        ))
    }

    /// Deletes every selected id through `get` + `delete`, without changesets or a
    /// per-id authorization check. The loop is sequential; the first failure aborts
    /// the rest and earlier deletions stay done.
    async fn batch_destroy(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let model = resource.model();
        // A lone id is a one-element selection.
        let ids: Vec<Id> = match params.get(SELECTION_PARAM) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| parse_id(Some(v)))
                .collect::<Result<_, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![parse_id(Some(single))?],
        };

        warn!(
            count = ids.len(),
            "Batch destroy bypasses changesets and per-record authorization"
        );

        let mut destroyed = 0usize;
        for id in ids {
            let record = self
                .repo
                .get(model.source(), id)
                .await?
                .ok_or_else(|| RepoError::NotFound {
                    resource: model.source().to_string(),
                    id: id.to_string(),
                })?;
            self.repo.delete(model.source(), record).await?;
            destroyed += 1;
        }

        let noun = if destroyed == 1 {
            model.singular()
        } else {
            model.plural()
        };
        info!(destroyed, "Batch destroyed");
        ctx.put_flash(Flash::Notice(format!(
            "Successfully destroyed {destroyed} {noun}."
        )));
        Ok(ActionOutcome::redirect(
            self.config.index_path(resource.route_key()),
        ))
    }

    async fn csv(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
    ) -> Result<ActionOutcome, DispatchError> {
        let records = self.repo.export(resource.model().source()).await?;
        let content = match records.split_first() {
            Some((first, rest)) => self.layout.build_csv(resource, first, rest)?,
            None => String::new(),
        };
        debug!(rows = records.len(), "CSV export");

        ctx.put_resp_header(
            "content-disposition",
            format!("inline; filename=\"{}.csv\"", resource.route_key()),
        );
        ctx.put_default_content_type("text/csv");
        if ctx.status.is_none() {
            ctx.put_status(200);
        }
        Ok(ActionOutcome::Rendered {
            content,
            resource: None,
        })
    }

    async fn nested(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let field = params
            .get(FIELD_NAME_PARAM)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let not_found = || DispatchError::NestedFieldNotFound {
            resource: resource.route_key().to_string(),
            field: field.to_string(),
        };

        let input = resource.find_input(ctx, field).ok_or_else(not_found)?;
        let loader = input.collection.clone().ok_or_else(not_found)?;
        let records = loader.load(ctx, params).await?;
        debug!(field, candidates = records.len(), "Nested field resolved");

        let content = match resource.views().ajax() {
            Some(view) => view(ctx, params, &records, &input),
            None => self.layout.ajax_view(ctx, resource, params, &records, &input),
        };
        ctx.put_default_content_type("text/javascript");
        Ok(ActionOutcome::Rendered {
            content,
            resource: None,
        })
    }

    fn render_form(
        &self,
        ctx: &RequestContext,
        resource: &ResourceDefinition,
        record: &Record,
        params: &Params,
    ) -> String {
        match resource.views().form() {
            Some(view) => view(ctx, record, params),
            None => self.layout.form_view(ctx, resource, record, params),
        }
    }

    fn reject(
        &self,
        ctx: &mut RequestContext,
        resource: &ResourceDefinition,
        candidate: &Record,
        errors: ErrorMap,
        params: &Params,
    ) -> ActionOutcome {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Changeset rejected");
        ctx.put_flash(Flash::Error(INVALID_NOTICE.to_string()));
        ctx.put_flash(Flash::InlineErrors(errors.clone()));
        ActionOutcome::ValidationFailed {
            content: self.render_form(ctx, resource, candidate, params),
            errors,
        }
    }
}

/// The `params[route_key]` sub-map, or an empty map.
fn field_params(resource: &ResourceDefinition, params: &Params) -> Params {
    params
        .get(resource.route_key())
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(&json!("42"))).unwrap(), 42);
        assert_eq!(parse_id(Some(&json!(7))).unwrap(), 7);
        assert!(matches!(
            parse_id(Some(&json!("abc"))),
            Err(DispatchError::InvalidId(raw)) if raw == "abc"
        ));
        assert!(parse_id(Some(&json!(-1))).is_err());
        assert!(parse_id(None).is_err());
    }
}
