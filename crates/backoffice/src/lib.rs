//! # Backoffice
//!
//! The request-dispatch core of an administrative back-office that sits in front of an
//! application's data models. Given a request naming a registered resource and an
//! action, it decides which handler governs the action, runs the pre-action pipeline
//! and executes either a host-supplied custom action or a built-in CRUD action,
//! producing a typed [`ActionOutcome`].
//!
//! ## Request flow
//!
//! ```text
//! AdminRequest { resource?, action, params }
//!     |
//!     v
//! ResourceRegistry ---- lookup(key) / default_resource()
//!     |
//!     v
//! ParamScrubber ------- trims params[route_key] on create/update
//!     |
//!     v
//! InterceptorPipeline - defaults merged with the resource's entries, then the
//!     |                 `authorized` verdict (skipped for built-in `nested`)
//!     v
//! BeforeFilterGate ---- optional hook scoped by only/except
//!     |
//!     v
//! ActionResolver ------ member > collection > built-in
//!     |
//!     v
//! handler -> ActionOutcome::{Rendered, Redirected, ValidationFailed}
//! ```
//!
//! Every stage returns `Result<_, DispatchError>`; the first error aborts the request
//! and [`Dispatcher::handle`] maps it to a generic error response.
//!
//! ## Collaborators
//!
//! The core calls out through two narrow contracts:
//!
//! - [`Repo`] - queries, change validation, insert/update/delete. [`store::MemoryRepo`]
//!   is an actor-backed in-memory implementation; [`mock::MockRepo`] is a scripted
//!   double for tests.
//! - [`Layout`] - default views, nested-field fragments and CSV. [`PlainLayout`] renders
//!   plain text.
//!
//! ## Example
//!
//! ```rust
//! use backoffice::mock::MockRepo;
//! use backoffice::{
//!     AdminRequest, Dispatcher, Record, RequestContext, ResourceDefinition, ResourceRegistry,
//!     Schema,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ResourceRegistry::builder()
//!         .register(
//!             ResourceDefinition::builder("widgets", Schema::new("Widget", "widgets").required("name"))
//!                 .build(),
//!         )
//!         .unwrap()
//!         .build();
//!
//!     let repo = MockRepo::new();
//!     repo.expect_insert().return_ok(Record::with_id(12).field("name", "Bolt"));
//!     let dispatcher = Dispatcher::builder(registry, Arc::new(repo.clone())).build();
//!
//!     let mut ctx = RequestContext::default();
//!     let request = AdminRequest::new("create")
//!         .resource("widgets")
//!         .param("widgets", serde_json::json!({ "name": " Bolt " }));
//!     let response = dispatcher.handle(&mut ctx, request).await;
//!
//!     assert_eq!(response.status, 302);
//!     assert_eq!(response.header("location"), Some("/admin/widgets/12"));
//!     repo.verify();
//! }
//! ```

pub mod before_filter;
pub mod changeset;
pub mod config;
pub mod context;
pub mod crud;
pub mod dispatcher;
pub mod error;
pub mod interceptor;
pub mod layout;
pub mod mock;
pub mod model;
pub mod outcome;
pub mod registry;
pub mod repo;
pub mod resolver;
pub mod resource;
pub mod scrub;
pub mod store;
pub mod tracing;

// Re-export core types for convenience
pub use before_filter::{BeforeFilter, BeforeFilterGate, BeforeFilterHook, FilterScope};
pub use changeset::{Changeset, ChangesetFn, ChangesetValidator, ErrorMap, Validation};
pub use config::AdminConfig;
pub use context::{Flash, Params, RequestContext, AUTHORIZED_ASSIGN};
pub use crud::CrudActionSet;
pub use dispatcher::{AdminRequest, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, RepoError};
pub use interceptor::{authorize, interceptor_fn, Interceptor, InterceptorEntry, InterceptorPipeline};
pub use layout::{CollectionLoader, Content, FormBlock, FormInput, Layout, PlainLayout};
pub use model::{Id, Model, Record, Schema};
pub use outcome::{ActionOutcome, AdminResponse};
pub use registry::{RegistryError, ResourceRegistry};
pub use repo::{FetchKind, IndexFilter, IndexQuery, Page, Repo, SortOrder};
pub use resolver::{ActionResolver, BuiltinAction, Handler};
pub use resource::{CollectionAction, MemberAction, ResourceBuilder, ResourceDefinition, ResourceViews};
pub use scrub::ParamScrubber;
