//! Dispensary Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions
//! - Persistence trait abstractions over the storage backends
//! - Domain model types for persistence operations

pub mod entity;
pub mod memory;
pub mod model;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export persistence traits
pub use traits::{PersistenceService, PrescriptionPersistence, StockPersistence};

// Re-export SQL backend
pub use sql::{ExternalDbPersistService, create_schema};

// Re-export memory backend
pub use memory::MemoryPersistService;

// Re-export model types
pub use model::{MedicineInfo, PrescriptionInfo, StockLevel, StorageMode};
