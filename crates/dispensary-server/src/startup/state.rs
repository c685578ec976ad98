//! Backend wiring: persistence, lock store and services.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use dispensary_consistency::{LockCoordinator, LockStore, MemoryLockStore, RedisLockStore};
use dispensary_core::StockService;
use dispensary_persistence::{
    ExternalDbPersistService, MemoryPersistService, PersistenceService, StorageMode,
    create_schema,
};

use crate::model::common::{AppState, Configuration, LockStoreKind};

/// Housekeeping tasks that live as long as the server; aborted on drop.
#[derive(Default)]
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn build_persistence(
    configuration: &Configuration,
) -> Result<Arc<dyn PersistenceService>, Box<dyn std::error::Error>> {
    match configuration.persistence_mode() {
        StorageMode::Memory => {
            warn!("Memory persistence selected; stock is lost on restart");
            Ok(Arc::new(MemoryPersistService::new()))
        }
        StorageMode::ExternalDb => {
            let db = configuration.database_connection().await?;
            if configuration.init_schema() {
                create_schema(&db).await?;
                info!("Database schema initialized");
            }
            let persistence = ExternalDbPersistService::new(db);
            persistence.health_check().await?;
            Ok(Arc::new(persistence))
        }
    }
}

async fn build_lock_store(
    configuration: &Configuration,
    tasks: &mut BackgroundTasks,
) -> Result<Arc<dyn LockStore>, Box<dyn std::error::Error>> {
    match configuration.lock_store() {
        LockStoreKind::Redis => {
            let url = configuration.redis_url();
            let store = RedisLockStore::connect(&url).await?;
            store.ping().await?;
            info!("Connected to lock store at {}", url);
            Ok(Arc::new(store))
        }
        LockStoreKind::Memory => {
            warn!("Memory lock store selected; locks are not shared between processes");
            let store = MemoryLockStore::new();
            tasks
                .handles
                .push(store.spawn_cleanup(configuration.lock_cleanup_interval()));
            Ok(Arc::new(store))
        }
    }
}

/// Build the application state from configuration.
///
/// Must run inside a Tokio runtime. The returned tasks must be kept alive
/// alongside the server.
pub async fn build_app_state(
    configuration: &Configuration,
) -> Result<(Arc<AppState>, BackgroundTasks), Box<dyn std::error::Error>> {
    let mut tasks = BackgroundTasks::default();

    let persistence = build_persistence(configuration).await?;
    let store = build_lock_store(configuration, &mut tasks).await?;

    let options = configuration.lock_options();
    let locks = LockCoordinator::new(store, options)?;
    info!(
        ttl_ms = options.ttl.as_millis() as u64,
        max_wait_ms = options.max_wait.as_millis() as u64,
        poll_interval_ms = options.poll_interval.as_millis() as u64,
        "Resource lock configured"
    );

    let stock = StockService::new(persistence.clone(), locks);
    Ok((Arc::new(AppState::new(stock, persistence)), tasks))
}

#[cfg(test)]
mod tests {
    use config::Config;

    use super::*;

    fn memory_configuration() -> Configuration {
        Configuration::from_config(
            Config::builder()
                .set_override("persistence.mode", "memory")
                .unwrap()
                .set_override("lock.store", "memory")
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_memory_backends() {
        let (state, tasks) = build_app_state(&memory_configuration()).await.unwrap();
        assert_eq!(state.persistence.storage_mode(), StorageMode::Memory);
        assert_eq!(tasks.len(), 1);
        assert!(state.stock.list_medicines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_lock_options_rejected() {
        let config = Config::builder()
            .set_override("persistence.mode", "memory")
            .unwrap()
            .set_override("lock.store", "memory")
            .unwrap()
            .set_override("lock.poll_interval_ms", 0)
            .unwrap()
            .build()
            .unwrap();

        let result = build_app_state(&Configuration::from_config(config)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sqlite_with_schema_init() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("state.db").display());
        let config = Config::builder()
            .set_override("db.url", url)
            .unwrap()
            .set_override("persistence.init_schema", true)
            .unwrap()
            .set_override("lock.store", "memory")
            .unwrap()
            .build()
            .unwrap();

        let (state, _tasks) = build_app_state(&Configuration::from_config(config))
            .await
            .unwrap();
        assert_eq!(state.persistence.storage_mode(), StorageMode::ExternalDb);
    }
}
