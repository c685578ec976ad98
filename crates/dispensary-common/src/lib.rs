//! Dispensary Common - Shared types and error codes
//!
//! This crate provides the foundational types used across all Dispensary components:
//! - Error taxonomy and error codes
//! - Common constants

pub mod error;

// Re-exports for convenience
pub use error::{ErrorCode, InventoryError};

/// Resource type segment used in lock keys guarding medicine rows
pub const MEDICINE_RESOURCE: &str = "medicine";

/// Prefix shared by every lock key
pub const LOCK_KEY_PREFIX: &str = "lock";
