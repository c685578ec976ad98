//! Persistence traits for the storage abstraction layer
//!
//! Backends: external database (MySQL/PostgreSQL) and process memory. Neither
//! isolates a sequence of calls; callers serialise mutations of one medicine
//! through its resource lock.

pub mod prescription;
pub mod stock;

pub use prescription::PrescriptionPersistence;
pub use stock::StockPersistence;

use async_trait::async_trait;

use crate::model::StorageMode;

/// Unified persistence service trait
#[async_trait]
pub trait PersistenceService: StockPersistence + PrescriptionPersistence + Send + Sync {
    /// Get the current storage mode
    fn storage_mode(&self) -> StorageMode;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}
