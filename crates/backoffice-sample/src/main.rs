//! # Backoffice Sample
//!
//! Runs a short admin session against in-memory stores:
//! 1. Starting the [`AdminSystem`].
//! 2. Creating contacts and a widget, including one rejected form post.
//! 3. Publishing the widget through its custom member action.
//! 4. Exporting contacts as CSV and batch-destroying them.

use backoffice::tracing::setup_tracing;
use backoffice::{AdminConfig, AdminRequest, AdminResponse};
use backoffice_sample::{AdminSystem, SystemError};
use serde_json::json;
use tracing::{info, warn, Instrument};

fn report(label: &str, response: &AdminResponse) {
    if response.is_success() {
        info!(
            label,
            status = response.status,
            location = response.header("location").unwrap_or("-"),
            "Response"
        );
    } else {
        warn!(label, status = response.status, body = %response.body, "Response");
    }
}

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    setup_tracing();

    let system = AdminSystem::start(AdminConfig::from_env())?;
    let dispatcher = system.dispatcher();
    let mut ids = Vec::new();

    let span = tracing::info_span!("contacts");
    async {
        for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
            let mut ctx = AdminSystem::session("admin", 1);
            let request = AdminRequest::new("create")
                .resource("contacts")
                .param("contacts", json!({ "name": name, "email": email }));
            let response = dispatcher.handle(&mut ctx, request).await;
            report("create contact", &response);
            if let Some(id) = response
                .header("location")
                .and_then(|location| location.rsplit('/').next())
            {
                ids.push(id.to_string());
            }
        }

        let mut ctx = AdminSystem::session("admin", 1);
        let request = AdminRequest::new("create")
            .resource("contacts")
            .param("contacts", json!({ "name": "   " }));
        report("rejected contact", &dispatcher.handle(&mut ctx, request).await);
    }
    .instrument(span)
    .await;

    let span = tracing::info_span!("widgets");
    async {
        let mut ctx = AdminSystem::session("editor", 7);
        let request = AdminRequest::new("create")
            .resource("widgets")
            .param("widgets", json!({ "name": "Sprocket", "price": "4.50", "owner_id": "" }));
        let response = dispatcher.handle(&mut ctx, request).await;
        report("create widget", &response);

        let mut ctx = AdminSystem::session("editor", 7);
        let request = AdminRequest::new("publish").resource("widgets").param("id", "1");
        report("publish widget", &dispatcher.handle(&mut ctx, request).await);

        let mut ctx = AdminSystem::session("editor", 7);
        let request = AdminRequest::new("index").resource("contacts");
        report("editor on contacts", &dispatcher.handle(&mut ctx, request).await);
    }
    .instrument(span)
    .await;

    let span = tracing::info_span!("cleanup");
    async {
        let mut ctx = AdminSystem::session("admin", 1);
        let response = dispatcher
            .handle(&mut ctx, AdminRequest::new("csv").resource("contacts"))
            .await;
        report("export contacts", &response);
        info!(csv = %response.body, "Contacts exported");

        let mut ctx = AdminSystem::session("admin", 1);
        let request = AdminRequest::new("batch_action")
            .resource("contacts")
            .param("batch_action", "destroy")
            .param("collection_selection", json!(ids));
        let response = dispatcher.handle(&mut ctx, request).await;
        report("batch destroy", &response);
        if let Some(notice) = ctx.notice() {
            info!(notice, "Flash");
        }
    }
    .instrument(span)
    .await;

    system.shutdown().await?;
    info!("Sample completed");
    Ok(())
}
