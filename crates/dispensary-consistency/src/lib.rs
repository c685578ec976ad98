//! Dispensary Consistency - Resource locking across requests and processes
//!
//! This crate provides:
//! - Process-local exclusion per resource key
//! - Distributed exclusion over Redis or an in-memory store
//! - A bounded polling coordinator producing scoped lock handles

pub mod lock;

// Re-export commonly used types
pub use lock::{
    DistributedLock, LocalGuard, LocalPermit, LockCoordinator, LockError, LockHandle, LockKey,
    LockOptions, LockStats, LockStore, LockToken, MemoryLockStore, RedisLockStore, StoreError,
};
