//! # System Lifecycle
//!
//! Starts and stops everything the admin surface needs.
//!
//! ## Startup
//!
//! 1. **Stores** - one [`StoreActor`](backoffice::store::StoreActor) per model source,
//!    each spawned on its own task.
//! 2. **Repo** - a [`MemoryRepo`](backoffice::store::MemoryRepo) holding a client for
//!    every store.
//! 3. **Registry** - the resource definitions from [`crate::admin`]. Custom actions and
//!    loaders receive their own handle on the repo.
//! 4. **Dispatcher** - the registry, the repo, the [`RequireRole`](crate::admin::RequireRole)
//!    default interceptor and the [`AdminConfig`](backoffice::AdminConfig).
//!
//! ## Graceful Shutdown
//!
//! The stores stop when their last client is dropped, so [`AdminSystem::shutdown`]
//! drops the dispatcher (which owns the repo and every registered action) and then
//! awaits the store tasks.
//!
//! **Clones keep the stores alive:** a [`Dispatcher`](backoffice::Dispatcher) cloned
//! out of the system must be dropped before calling `shutdown`, or the await never
//! completes.
//!
//! ```rust,ignore
//! let system = AdminSystem::start(AdminConfig::from_env())?;
//! let mut ctx = AdminSystem::session("admin", 1);
//! let response = system.dispatcher().handle(&mut ctx, AdminRequest::new("index")).await;
//! system.shutdown().await?;
//! ```

pub mod admin_system;

pub use admin_system::*;
