//! Error types and error codes for Dispensary
//!
//! This module defines:
//! - `InventoryError`: the application error taxonomy shared by every layer
//! - `ErrorCode`: structured error codes for API responses

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Application-specific error types
///
/// Every failure mode maps to exactly one variant, and every variant maps to
/// exactly one HTTP status (see [`InventoryError::status`]).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The external key-value store failed while acquiring a lock
    #[error("lock acquisition failed: {0}")]
    StoreUnavailable(String),

    /// The lock could not be obtained within the configured wait
    #[error("system busy, try again later")]
    LockTimeout(String),

    #[error("medicine '{0}' not found")]
    ResourceNotFound(String),

    /// A dispense asked for more than is on the shelf; nothing was written
    #[error("not enough stock. Available: {available}")]
    InsufficientQuantity {
        name: String,
        available: i32,
        requested: i32,
    },

    /// A read or write against the persistent store failed while the lock was held
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("caused: {0}")]
    IllegalArgument(String),
}

impl InventoryError {
    pub fn persistence(err: impl Display) -> Self {
        InventoryError::PersistenceFailure(err.to_string())
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        InventoryError::IllegalArgument(message.into())
    }

    /// HTTP status code for this error
    pub fn status(&self) -> u16 {
        match self {
            InventoryError::StoreUnavailable(_) => 500,
            InventoryError::LockTimeout(_) => 409,
            InventoryError::ResourceNotFound(_) => 404,
            InventoryError::InsufficientQuantity { .. } => 400,
            InventoryError::PersistenceFailure(_) => 500,
            InventoryError::IllegalArgument(_) => 400,
        }
    }

    /// Structured API error code for this error
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            InventoryError::StoreUnavailable(_) => LOCK_STORE_UNAVAILABLE,
            InventoryError::LockTimeout(_) => RESOURCE_CONFLICT,
            InventoryError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            InventoryError::InsufficientQuantity { .. } => INSUFFICIENT_STOCK,
            InventoryError::PersistenceFailure(_) => DATA_ACCESS_ERROR,
            InventoryError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const INSUFFICIENT_STOCK: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "insufficient stock",
};

pub const LOCK_STORE_UNAVAILABLE: ErrorCode<'static> = ErrorCode {
    code: 30002,
    message: "lock store unavailable",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_quantity_message() {
        let err = InventoryError::InsufficientQuantity {
            name: "aspirin".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(err.to_string(), "not enough stock. Available: 3");
        assert_eq!(err.status(), 400);
        assert_eq!(err.error_code(), INSUFFICIENT_STOCK);
    }

    #[test]
    fn test_status_mapping_is_one_to_one() {
        let cases = [
            (InventoryError::StoreUnavailable("down".into()), 500),
            (InventoryError::LockTimeout("lock:medicine:a".into()), 409),
            (InventoryError::ResourceNotFound("a".into()), 404),
            (InventoryError::PersistenceFailure("io".into()), 500),
            (InventoryError::IllegalArgument("bad".into()), 400),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "unexpected status for {:?}", err);
        }
    }

    #[test]
    fn test_lock_timeout_message() {
        let err = InventoryError::LockTimeout("lock:medicine:a".to_string());
        assert_eq!(err.to_string(), "system busy, try again later");
        assert_eq!(err.error_code().code, RESOURCE_CONFLICT.code);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&SUCCESS).unwrap();
        assert_eq!(json, r#"{"code":0,"message":"success"}"#);
    }
}
