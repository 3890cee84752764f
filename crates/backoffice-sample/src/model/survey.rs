use backoffice::Schema;

pub const SURVEYS: &str = "surveys";

/// Surveys start as drafts.
pub fn survey_schema() -> Schema {
    Schema::new("Survey", SURVEYS)
        .required("title")
        .field("status")
        .default_value("status", "draft")
}
