use super::roles::CURRENT_USER_ID;
use crate::model::{Widget, WidgetModel, CONTACTS, WIDGETS};
use async_trait::async_trait;
use backoffice::{
    ActionOutcome, AdminConfig, Changeset, CollectionLoader, DispatchError, Flash, FormBlock,
    FormInput, IndexFilter, MemberAction, Params, Record, Repo, RepoError, RequestContext,
    ResourceDefinition,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// `publish`: marks a widget as published and redirects back to it.
///
/// Publishing an already published widget only sets a notice.
pub struct Publish {
    repo: Arc<dyn Repo>,
    config: AdminConfig,
}

impl Publish {
    pub fn new(repo: Arc<dyn Repo>, config: AdminConfig) -> Self {
        Self { repo, config }
    }
}

#[async_trait]
impl MemberAction for Publish {
    async fn call(
        &self,
        ctx: &mut RequestContext,
        record: Record,
        _params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let id = record
            .id
            .ok_or_else(|| DispatchError::InvalidId("unsaved widget".to_string()))?;
        let widget = Widget::from_record(&record).map_err(|e| RepoError::Backend(e.to_string()))?;

        if widget.published {
            ctx.put_flash(Flash::Notice(format!("{} is already published.", widget.name)));
        } else {
            let mut changeset = Changeset::new(record);
            changeset.changes.insert("published".into(), json!(true));
            self.repo.update(WIDGETS, changeset).await?;
            info!(id, name = %widget.name, "Widget published");
            ctx.put_flash(Flash::Notice(format!("{} was published.", widget.name)));
        }

        Ok(ActionOutcome::redirect(self.config.show_path(WIDGETS, id)))
    }
}

/// Candidate owners for the widget form: every contact.
pub struct ContactOptions {
    repo: Arc<dyn Repo>,
}

impl ContactOptions {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CollectionLoader for ContactOptions {
    async fn load(&self, _ctx: &RequestContext, _params: &Params) -> Result<Vec<Record>, DispatchError> {
        Ok(self.repo.export(CONTACTS).await?)
    }
}

/// Defaults `owner_id` to the signed-in user.
fn set_owner(ctx: &mut RequestContext, params: &Params) -> Result<(), DispatchError> {
    let Some(user_id) = ctx.get_assign(CURRENT_USER_ID).cloned() else {
        return Ok(());
    };
    let mut params = params.clone();
    if let Some(Value::Object(fields)) = params.get_mut(WIDGETS) {
        let owner = fields.entry("owner_id").or_insert(Value::Null);
        if owner.is_null() {
            *owner = user_id;
        }
    }
    ctx.params = params;
    Ok(())
}

pub fn resource(repo: Arc<dyn Repo>, config: &AdminConfig) -> ResourceDefinition {
    let owners: Arc<dyn CollectionLoader> = Arc::new(ContactOptions::new(Arc::clone(&repo)));

    ResourceDefinition::builder(WIDGETS, WidgetModel)
        .menu_priority(3)
        .interceptor(
            Arc::new(super::RequireRole),
            json!({ "roles": ["admin", "editor"] }),
        )
        .before_filter_only("set_owner", ["create", "update"], set_owner)
        .member_handler("publish", Arc::new(Publish::new(repo, config.clone())))
        .index_filter(IndexFilter::new("name"))
        .form_blocks(move |_ctx| {
            vec![
                FormBlock::new("Widget")
                    .input(FormInput::new("name"))
                    .input(FormInput::new("price")),
                FormBlock::new("Ownership")
                    .input(FormInput::new("owner_id").label("Owner").loader(Arc::clone(&owners))),
            ]
        })
        .build()
}
