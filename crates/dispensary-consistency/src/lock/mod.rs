//! Resource Lock Implementation
//!
//! This module provides:
//! - Lock data model (keys, holder tokens, timing options, statistics)
//! - Process-local exclusion with bounded, self-expiring slots
//! - Distributed exclusion over a key-value store's set-if-absent primitive
//! - The polling coordinator that composes both into one scoped handle

mod coordinator;
mod distributed;
mod error;
mod local;
mod model;
mod redis_store;
mod store;

pub use coordinator::*;
pub use distributed::*;
pub use error::*;
pub use local::*;
pub use model::*;
pub use redis_store::*;
pub use store::*;
