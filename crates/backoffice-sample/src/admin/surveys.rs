use crate::model::{survey_schema, SURVEYS};
use async_trait::async_trait;
use backoffice::{
    ActionOutcome, CollectionAction, DispatchError, IndexFilter, Params, Repo, RequestContext,
    ResourceDefinition,
};
use serde_json::Value;
use std::sync::Arc;

/// `summary`: counts surveys, and how many of them are open.
pub struct Summary {
    repo: Arc<dyn Repo>,
}

impl Summary {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CollectionAction for Summary {
    async fn call(
        &self,
        _ctx: &mut RequestContext,
        _params: &Params,
    ) -> Result<ActionOutcome, DispatchError> {
        let surveys = self.repo.export(SURVEYS).await?;
        let open = surveys
            .iter()
            .filter(|survey| survey.get("status").and_then(Value::as_str) == Some("open"))
            .count();
        Ok(ActionOutcome::rendered(format!(
            "{} surveys, {} open",
            surveys.len(),
            open
        )))
    }
}

pub fn resource(repo: Arc<dyn Repo>) -> ResourceDefinition {
    ResourceDefinition::builder(SURVEYS, survey_schema())
        .menu_priority(2)
        .index_filter(IndexFilter::new("status"))
        .collection_handler("summary", Arc::new(Summary::new(repo)))
        .build()
}
