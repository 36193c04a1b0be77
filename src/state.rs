use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{self, UserStore};
use crate::services::{RegistryService, StoreRegistryService};

/// Process-wide handles, built once before serving and shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Arc<dyn UserStore>,

    pub registry: Arc<dyn RegistryService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = db::connect(&config.database).await?;
        startup_check(store.as_ref()).await;

        let registry =
            Arc::new(StoreRegistryService::new(store.clone())) as Arc<dyn RegistryService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            registry,
        })
    }
}

/// Pings the store and prepares indexes. Failures are logged only: the
/// process keeps starting and requests fail individually until the store
/// comes back. Returns whether the ping succeeded.
pub async fn startup_check(store: &dyn UserStore) -> bool {
    if let Err(e) = store.ping().await {
        error!("User store liveness check failed: {}", e);
        return false;
    }
    info!("User store connected");

    if let Err(e) = store.prepare().await {
        warn!(
            "Could not ensure unique username index, concurrent first logins may duplicate users: {}",
            e
        );
    }

    true
}
