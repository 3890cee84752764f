use backoffice::mock::{MockRepo, RepoCall};
use backoffice::{
    authorize, ActionOutcome, AdminRequest, DispatchError, Dispatcher, FetchKind, Flash, FormBlock,
    FormInput, Page, Params, Record, RepoError, RequestContext, ResourceDefinition, ResourceRegistry, Schema,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn widgets() -> ResourceDefinition {
    ResourceDefinition::builder(
        "widgets",
        Schema::new("Widget", "widgets")
            .required("name")
            .field("price")
            .field("owner_id"),
    )
    .menu_priority(3)
    .build()
}

fn dispatcher(resources: Vec<ResourceDefinition>, repo: &MockRepo) -> Dispatcher {
    let mut builder = ResourceRegistry::builder();
    for def in resources {
        builder = builder.register(def).unwrap();
    }
    Dispatcher::builder(builder.build(), Arc::new(repo.clone())).build()
}

fn page(records: Vec<Record>) -> Page {
    Page::paginate(records, 1, 20)
}

#[tokio::test]
async fn test_default_resource_is_lowest_priority() {
    let repo = MockRepo::new();
    let contacts = ResourceDefinition::builder("contacts", Schema::new("Contact", "contacts"))
        .menu_priority(1)
        .build();
    let surveys = ResourceDefinition::builder("surveys", Schema::new("Survey", "surveys"))
        .menu_priority(2)
        .build();
    let dispatcher = dispatcher(vec![surveys, contacts], &repo);

    repo.expect_index()
        .return_ok(page(vec![Record::with_id(1).field("name", "Ann")]));

    let mut ctx = RequestContext::default();
    let response = dispatcher.handle(&mut ctx, AdminRequest::new("index")).await;

    assert_eq!(response.status, 200);
    assert!(response.body.starts_with("contacts"));
    assert!(matches!(
        &repo.calls()[0],
        RepoCall::Index { source, .. } if source == "contacts"
    ));
    repo.verify();
}

#[tokio::test]
async fn test_member_action_gets_resolved_instance() {
    let repo = MockRepo::new();
    let accounts = ResourceDefinition::builder("accounts", Schema::new("Account", "accounts"))
        .member_action("publish", |ctx, record, _params| {
            ctx.assign("published", record.id);
            Ok(ActionOutcome::Rendered {
                content: format!("published {}", record.label()),
                resource: Some(record.clone()),
            })
        })
        .build();
    let dispatcher = dispatcher(vec![accounts], &repo);

    repo.expect_fetch(7)
        .return_ok(Record::with_id(7).field("name", "Acme"));

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(
            &mut ctx,
            AdminRequest::new("publish").resource("accounts").param("id", "7"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.content(), Some("published Acme"));
    assert_eq!(ctx.get_assign("published"), Some(&json!(7)));
    repo.verify();
}

#[tokio::test]
async fn test_member_action_reuses_pre_resolved_instance() {
    let repo = MockRepo::new();
    let accounts = ResourceDefinition::builder("accounts", Schema::new("Account", "accounts"))
        .member_action("publish", |_ctx, record, _params| {
            Ok(ActionOutcome::rendered(record.label()))
        })
        .build();
    let dispatcher = dispatcher(vec![accounts], &repo);

    let mut ctx = RequestContext::default();
    ctx.resource = Some(Record::with_id(7).field("name", "Scoped"));
    let outcome = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("publish").resource("accounts"))
        .await
        .unwrap();

    assert_eq!(outcome.content(), Some("Scoped"));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_create_valid_inserts_once_and_redirects_to_show() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_insert()
        .return_ok(Record::with_id(41).field("name", "Bolt"));

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("create")
        .resource("widgets")
        .param("widgets", json!({"name": "  Bolt  ", "price": 3}));
    let response = dispatcher.handle(&mut ctx, request).await;

    assert_eq!(response.status, 302);
    assert_eq!(response.header("location"), Some("/admin/widgets/41"));
    assert_eq!(ctx.notice(), Some("Widget was successfully created."));

    assert_eq!(repo.count(|c| matches!(c, RepoCall::Insert { .. })), 1);
    match &repo.calls()[0] {
        RepoCall::Insert { changes, .. } => assert_eq!(changes.get("name"), Some(&json!("Bolt"))),
        other => panic!("unexpected call {other:?}"),
    }
    repo.verify();
}

#[tokio::test]
async fn test_create_invalid_never_inserts() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("create")
        .resource("widgets")
        .param("widgets", json!({"name": "   ", "price": 9}));
    let outcome = dispatcher.dispatch(&mut ctx, request).await.unwrap();

    match &outcome {
        ActionOutcome::ValidationFailed { content, errors } => {
            assert_eq!(errors["name"], vec!["can't be blank".to_string()]);
            assert!(content.contains("widgets[price] = \"9\""));
            assert!(content.contains("! name can't be blank"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(ctx.flash.contains(&Flash::Error("Please correct the errors below.".into())));
    assert!(ctx
        .flash
        .iter()
        .any(|f| matches!(f, Flash::InlineErrors(errors) if errors.contains_key("name"))));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_changeset_response_is_200() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("create")
        .resource("widgets")
        .param("widgets", json!({"price": 9}));
    let response = dispatcher.handle(&mut ctx, request).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));
    assert!(matches!(response.outcome, Some(ActionOutcome::ValidationFailed { .. })));
}

#[tokio::test]
async fn test_update_redirects_to_show() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_fetch(5)
        .return_ok(Record::with_id(5).field("name", "Old"));
    repo.expect_update(5)
        .return_ok(Record::with_id(5).field("name", "New"));

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("update")
        .resource("widgets")
        .param("id", "5")
        .param("widgets", json!({"name": "New"}));
    let outcome = dispatcher.dispatch(&mut ctx, request).await.unwrap();

    assert_eq!(outcome.location(), Some("/admin/widgets/5"));
    assert_eq!(ctx.notice(), Some("Widget was successfully updated."));
    repo.verify();
}

#[tokio::test]
async fn test_custom_update_changeset_wins() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets").field("name"))
        .changeset_fn("update", |record, _params| {
            let mut changeset = backoffice::Changeset::new(record.clone());
            changeset.add_error("name", "is locked");
            changeset
        })
        .build();
    let dispatcher = dispatcher(vec![def], &repo);

    repo.expect_fetch(5).return_ok(Record::with_id(5).field("name", "Old"));

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("update")
        .resource("widgets")
        .param("id", 5)
        .param("widgets", json!({"name": "New"}));
    let outcome = dispatcher.dispatch(&mut ctx, request).await.unwrap();

    assert!(matches!(outcome, ActionOutcome::ValidationFailed { ref errors, .. } if errors["name"] == vec!["is locked".to_string()]));
    assert_eq!(repo.count(|c| matches!(c, RepoCall::Update { .. })), 0);
    repo.verify();
}

#[tokio::test]
async fn test_destroy_redirects_to_index() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_fetch(2).return_ok(Record::with_id(2));
    repo.expect_delete(2).return_ok(());

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("destroy").resource("widgets").param("id", "2"))
        .await
        .unwrap();

    assert_eq!(outcome.location(), Some("/admin/widgets"));
    assert_eq!(ctx.notice(), Some("Widget was successfully destroyed."));
    repo.verify();
}

fn batch(ids: Value) -> AdminRequest {
    AdminRequest::new("batch_action")
        .resource("widgets")
        .param("batch_action", "destroy")
        .param("collection_selection", ids)
}

#[tokio::test]
async fn test_batch_destroy_deletes_each_id() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    for id in [3, 5, 9] {
        repo.expect_get(id).return_ok(Some(Record::with_id(id)));
        repo.expect_delete(id).return_ok(());
    }

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(&mut ctx, batch(json!(["3", "5", "9"])))
        .await
        .unwrap();

    assert_eq!(outcome.location(), Some("/admin/widgets"));
    assert_eq!(ctx.notice(), Some("Successfully destroyed 3 widgets."));
    let deleted: Vec<Option<u64>> = repo
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            RepoCall::Delete { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec![Some(3), Some(5), Some(9)]);
    repo.verify();
}

#[tokio::test]
async fn test_batch_destroy_singular_notice() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_get(4).return_ok(Some(Record::with_id(4)));
    repo.expect_delete(4).return_ok(());

    let mut ctx = RequestContext::default();
    dispatcher.dispatch(&mut ctx, batch(json!(["4"]))).await.unwrap();
    assert_eq!(ctx.notice(), Some("Successfully destroyed 1 widget."));
}

#[tokio::test]
async fn test_batch_destroy_failure_aborts_remaining() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_get(3).return_ok(Some(Record::with_id(3)));
    repo.expect_delete(3).return_ok(());
    repo.expect_get(5).return_ok(Some(Record::with_id(5)));
    repo.expect_delete(5).return_err(RepoError::Backend("locked".into()));

    let mut ctx = RequestContext::default();
    let err = dispatcher
        .dispatch(&mut ctx, batch(json!(["3", "5", "9"])))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Repo(RepoError::Backend(_))));
    assert_eq!(repo.count(|c| matches!(c, RepoCall::Get { id: 9, .. })), 0);
    assert!(ctx.notice().is_none());
    repo.verify();
}

#[tokio::test]
async fn test_batch_destroy_rejects_bad_ids_before_deleting() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    let mut ctx = RequestContext::default();
    let response = dispatcher.handle(&mut ctx, batch(json!(["3", "x"]))).await;

    assert_eq!(response.status, 400);
    assert!(repo.calls().is_empty());
}

fn owner_stamping_widgets() -> ResourceDefinition {
    ResourceDefinition::builder(
        "widgets",
        Schema::new("Widget", "widgets").required("name").field("owner_id"),
    )
    .before_filter_only("set_owner", ["create", "update"], |ctx, params| {
        ctx.assign("set_owner_ran", true);
        let mut params: Params = params.clone();
        if let Some(Value::Object(fields)) = params.get_mut("widgets") {
            fields.insert("owner_id".into(), json!(99));
        }
        ctx.params = params;
        Ok(())
    })
    .build()
}

#[tokio::test]
async fn test_before_filter_skipped_outside_scope() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![owner_stamping_widgets()], &repo);

    repo.expect_fetch(1).return_ok(Record::with_id(1).field("name", "Bolt"));

    let mut ctx = RequestContext::default();
    dispatcher
        .dispatch(&mut ctx, AdminRequest::new("show").resource("widgets").param("id", "1"))
        .await
        .unwrap();

    assert!(ctx.get_assign("set_owner_ran").is_none());
    repo.verify();
}

#[tokio::test]
async fn test_before_filter_runs_in_scope_and_rewrites_params() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![owner_stamping_widgets()], &repo);

    repo.expect_insert().return_ok(Record::with_id(8));

    let mut ctx = RequestContext::default();
    dispatcher
        .dispatch(
            &mut ctx,
            AdminRequest::new("create")
                .resource("widgets")
                .param("widgets", json!({"name": "Bolt"})),
        )
        .await
        .unwrap();

    assert_eq!(ctx.get_assign("set_owner_ran"), Some(&json!(true)));
    match &repo.calls()[0] {
        RepoCall::Insert { changes, .. } => assert_eq!(changes.get("owner_id"), Some(&json!(99))),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_stops_before_handler() {
    let repo = MockRepo::new();
    let registry = ResourceRegistry::builder()
        .register(widgets())
        .unwrap()
        .build();
    let dispatcher = Dispatcher::builder(registry, Arc::new(repo.clone()))
        .default_interceptor(
            authorize("admin_only", |ctx, _resource, _action| {
                ctx.get_assign("admin") == Some(&json!(true))
            }),
            Value::Null,
        )
        .build();

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("index").resource("widgets"))
        .await;
    assert_eq!(response.status, 403);
    assert_eq!(response.body, "Forbidden");
    assert!(response.outcome.is_none());
    assert!(repo.calls().is_empty());

    repo.expect_index().return_ok(page(Vec::new()));
    let mut ctx = RequestContext::default();
    ctx.assign("admin", true);
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("index").resource("widgets"))
        .await;
    assert_eq!(response.status, 200);
    repo.verify();
}

#[tokio::test]
async fn test_unknown_routes() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    let mut ctx = RequestContext::default();
    let err = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("index").resource("gadgets"))
        .await
        .unwrap_err();
    assert!(err.is_unknown_route());

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("explode").resource("widgets"))
        .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_csv_sets_headers() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_export().return_ok(vec![
        Record::with_id(1).field("name", "Bolt"),
        Record::with_id(2).field("name", "Nut"),
    ]);
    repo.expect_export().return_ok(Vec::new());

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("csv").resource("widgets"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/csv; charset=utf-8"));
    assert_eq!(
        response.header("content-disposition"),
        Some("inline; filename=\"widgets.csv\"")
    );
    assert_eq!(response.body, "id,name\n1,Bolt\n2,Nut\n");

    let mut ctx = RequestContext::default();
    ctx.put_status(203);
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("csv").resource("widgets"))
        .await;
    assert_eq!(response.status, 203);
    assert!(response.body.is_empty());
    repo.verify();
}

fn widgets_with_owner_input() -> ResourceDefinition {
    ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets"))
        .interceptor(authorize("deny_all", |_, _, _| false), Value::Null)
        .form_blocks(|_ctx| {
            vec![
                FormBlock::new("main").input(FormInput::new("name")),
                FormBlock::new("ownership").input(FormInput::new("owner_id").collection(
                    |_ctx: &RequestContext, _params: &Params| {
                        vec![
                            Record::with_id(1).field("name", "Ann"),
                            Record::with_id(2).field("name", "Bob"),
                        ]
                    },
                )),
            ]
        })
        .build()
}

#[tokio::test]
async fn test_nested_skips_interceptors_and_renders_options() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets_with_owner_input()], &repo);

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(
            &mut ctx,
            AdminRequest::new("nested")
                .resource("widgets")
                .param("field_name", "owner_id"),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("content-type"),
        Some("text/javascript; charset=utf-8")
    );
    assert!(response.body.contains("<option value='2'>Bob</option>"));

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("index").resource("widgets"))
        .await;
    assert_eq!(response.status, 403);
}

#[tokio::test]
async fn test_nested_unknown_field() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets_with_owner_input()], &repo);

    for field in ["color", "name"] {
        let mut ctx = RequestContext::default();
        let err = dispatcher
            .dispatch(
                &mut ctx,
                AdminRequest::new("nested")
                    .resource("widgets")
                    .param("field_name", field),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NestedFieldNotFound { .. }));
    }
}

#[tokio::test]
async fn test_show_prefers_custom_view() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets"))
        .show_view(|_ctx, record| format!("custom {}", record.label()))
        .build();
    let dispatcher = dispatcher(vec![def], &repo);

    repo.expect_fetch(3).return_ok(Record::with_id(3).field("name", "Bolt"));

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("show").resource("widgets").param("id", "3"))
        .await
        .unwrap();
    assert_eq!(outcome.content(), Some("custom Bolt"));
    repo.verify();
}

#[tokio::test]
async fn test_new_renders_blank_without_repo_calls() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder(
        "surveys",
        Schema::new("Survey", "surveys")
            .required("title")
            .default_value("status", "draft"),
    )
    .build();
    let dispatcher = dispatcher(vec![def], &repo);

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("new").resource("surveys"))
        .await
        .unwrap();

    match outcome {
        ActionOutcome::Rendered { content, resource } => {
            let record = resource.unwrap();
            assert_eq!(record.id, None);
            assert_eq!(record.get("status"), Some(&json!("draft")));
            assert!(content.starts_with("New Survey"));
        }
        other => panic!("expected a rendered form, got {other:?}"),
    }
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_edit_fetches_for_edit_and_renders_record() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_fetch(4)
        .return_ok(Record::with_id(4).field("name", "Gear"));

    let mut ctx = RequestContext::default();
    let outcome = dispatcher
        .dispatch(&mut ctx, AdminRequest::new("edit").resource("widgets").param("id", "4"))
        .await
        .unwrap();

    match outcome {
        ActionOutcome::Rendered { content, resource } => {
            assert_eq!(resource, Some(Record::with_id(4).field("name", "Gear")));
            assert!(content.starts_with("Edit Widget #4"));
            assert!(content.contains("widgets[name] = \"Gear\""));
        }
        other => panic!("expected a rendered form, got {other:?}"),
    }
    assert_eq!(
        repo.calls(),
        vec![RepoCall::Fetch {
            source: "widgets".into(),
            kind: FetchKind::Edit,
            id: 4
        }]
    );
    repo.verify();
}

#[tokio::test]
async fn test_before_filter_except_skips_listed_actions() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets"))
        .before_filter_except("audit", ["index"], |ctx, _params| {
            ctx.assign("audited", true);
            Ok(())
        })
        .build();
    let dispatcher = dispatcher(vec![def], &repo);

    repo.expect_index().return_ok(page(Vec::new()));
    let mut ctx = RequestContext::default();
    dispatcher
        .dispatch(&mut ctx, AdminRequest::new("index").resource("widgets"))
        .await
        .unwrap();
    assert!(ctx.get_assign("audited").is_none());

    let mut ctx = RequestContext::default();
    dispatcher
        .dispatch(&mut ctx, AdminRequest::new("new").resource("widgets"))
        .await
        .unwrap();
    assert_eq!(ctx.get_assign("audited"), Some(&json!(true)));
    repo.verify();
}

#[tokio::test]
async fn test_custom_nested_action_still_authorized() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets"))
        .interceptor(authorize("deny_all", |_, _, _| false), Value::Null)
        .member_action("nested", |_ctx, _record, _params| {
            Ok(ActionOutcome::rendered("custom ran"))
        })
        .build();
    let dispatcher = dispatcher(vec![def], &repo);

    let mut ctx = RequestContext::default();
    let response = dispatcher
        .handle(&mut ctx, AdminRequest::new("nested").resource("widgets").param("id", "1"))
        .await;

    assert_eq!(response.status, 403);
    assert_ne!(response.body, "custom ran");
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn test_batch_destroy_accepts_single_id() {
    let repo = MockRepo::new();
    let dispatcher = dispatcher(vec![widgets()], &repo);

    repo.expect_get(5).return_ok(Some(Record::with_id(5)));
    repo.expect_delete(5).return_ok(());

    let mut ctx = RequestContext::default();
    let response = dispatcher.handle(&mut ctx, batch(json!("5"))).await;

    assert_eq!(response.status, 302);
    assert_eq!(ctx.notice(), Some("Successfully destroyed 1 widget."));
    repo.verify();

    let mut ctx = RequestContext::default();
    let response = dispatcher.handle(&mut ctx, batch(json!({"id": 5}))).await;
    assert_eq!(response.status, 400);
    assert_eq!(repo.calls().len(), 2);
}

#[tokio::test]
async fn test_batch_notice_splits_multi_word_names() {
    let repo = MockRepo::new();
    let def = ResourceDefinition::builder("blog_posts", Schema::new("BlogPost", "blog_posts")).build();
    let dispatcher = dispatcher(vec![def], &repo);

    for id in [1, 2] {
        repo.expect_get(id).return_ok(Some(Record::with_id(id)));
        repo.expect_delete(id).return_ok(());
    }

    let mut ctx = RequestContext::default();
    let request = AdminRequest::new("batch_action")
        .resource("blog_posts")
        .param("batch_action", "destroy")
        .param("collection_selection", json!(["1", "2"]));
    dispatcher.handle(&mut ctx, request).await;

    assert_eq!(ctx.notice(), Some("Successfully destroyed 2 blog posts."));
    repo.verify();
}
