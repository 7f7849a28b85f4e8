pub mod db;
pub mod memory;
pub mod postgres;
pub mod storage;

use anyhow::Result;

use crate::app::store::Stores;
use crate::config::{AppConfig, StoreBackend};
use crate::infra::db::Db;
use crate::infra::storage::ObjectStorage;

/// Build the store handles for the configured backend.
pub async fn connect(config: &AppConfig) -> Result<Stores> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let db = Db::connect(config).await?;
            let storage = ObjectStorage::new(config).await?;
            tracing::info!("using postgres store backend");
            Ok(postgres::stores(db, storage))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store backend, data is not persisted");
            Ok(memory::stores())
        }
    }
}
