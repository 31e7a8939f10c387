//! Pick a backend from [`StorageConfig`].

use std::sync::Arc;

use svitlo_core::config::{StorageConfig, StoreBackend};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::json_file::{JsonScheduleStore, JsonSubscriptionRegistry};
use crate::memory::{MemoryScheduleStore, MemorySubscriptionRegistry};
use crate::postgres::PgStore;
use crate::traits::{ScheduleStore, SubscriptionRegistry};

/// The two stores the rest of the system talks to.
#[derive(Clone)]
pub struct Stores {
    pub schedule: Arc<dyn ScheduleStore>,
    pub subscribers: Arc<dyn SubscriptionRegistry>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            schedule: Arc::new(MemoryScheduleStore::new()),
            subscribers: Arc::new(MemorySubscriptionRegistry::new()),
        }
    }
}

pub async fn open_stores(config: &StorageConfig) -> Result<Stores> {
    let stores = match config.backend {
        StoreBackend::Memory => Stores::in_memory(),
        StoreBackend::File => Stores {
            schedule: Arc::new(JsonScheduleStore::new(&config.data_dir)),
            subscribers: Arc::new(JsonSubscriptionRegistry::new(&config.data_dir)),
        },
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::NotConfigured("DATABASE_URL is required for the postgres backend".to_string())
            })?;
            let pg = Arc::new(PgStore::connect(url, config.max_connections).await?);
            Stores {
                schedule: pg.clone(),
                subscribers: pg,
            }
        }
    };
    info!(backend = %config.backend, "stores opened");
    Ok(stores)
}
