use crate::admin::{self, RequireRole, CURRENT_USER_ID, CURRENT_USER_ROLE};
use crate::model::{CONTACTS, SURVEYS, WIDGETS};
use backoffice::store::{MemoryRepo, StoreActor};
use backoffice::{AdminConfig, DispatchError, Dispatcher, RegistryError, Repo, RequestContext};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const STORE_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Admin registry setup failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("Admin request failed: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Store task failed: {0}")]
    Store(#[from] tokio::task::JoinError),
}

/// The running admin surface: a dispatcher over actor-backed stores.
pub struct AdminSystem {
    dispatcher: Dispatcher,
    handles: Vec<JoinHandle<()>>,
}

impl AdminSystem {
    /// Spawns the stores and wires the dispatcher. Must be called inside a Tokio runtime.
    pub fn start(config: AdminConfig) -> Result<Self, SystemError> {
        let mut repo = MemoryRepo::new();
        let mut handles = Vec::new();
        for source in [CONTACTS, SURVEYS, WIDGETS] {
            let (actor, client) = StoreActor::new(source, STORE_BUFFER);
            handles.push(tokio::spawn(actor.run()));
            repo = repo.with_store(client);
        }
        let repo: Arc<dyn Repo> = Arc::new(repo);

        let registry = admin::build_registry(Arc::clone(&repo), &config)?;
        let dispatcher = Dispatcher::builder(registry, repo)
            .default_interceptor(Arc::new(RequireRole), json!({ "roles": ["admin"] }))
            .config(config)
            .build();

        info!(stores = handles.len(), "Admin system started");
        Ok(Self {
            dispatcher,
            handles,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// A request context for a signed-in user.
    pub fn session(role: &str, user_id: u64) -> RequestContext {
        let mut ctx = RequestContext::default();
        ctx.assign(CURRENT_USER_ROLE, role)
            .assign(CURRENT_USER_ID, user_id);
        ctx
    }

    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down admin system");
        drop(self.dispatcher);
        for handle in self.handles {
            handle.await?;
        }
        info!("Admin system stopped");
        Ok(())
    }
}
