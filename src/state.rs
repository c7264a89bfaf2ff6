use std::sync::Arc;

use crate::config::Config;
use crate::error::StoreError;
use crate::service::ActivityService;
use crate::store::{ActivityStore, MemoryStore, SqliteStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub activities: ActivityService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ActivityStore>) -> Self {
        let activities = ActivityService::new(store, config.energy);
        Self {
            config: Arc::new(config),
            activities,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Picks the store from `config.database_url`.
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        let store: Arc<dyn ActivityStore> = match config.database_url.as_deref() {
            Some(url) => Arc::new(SqliteStore::connect(url).await?),
            None => {
                tracing::warn!("DATABASE_URL not set; activities are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(config, store))
    }
}
