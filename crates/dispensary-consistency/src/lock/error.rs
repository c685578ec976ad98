//! Lock error types

use std::time::Duration;

use dispensary_common::InventoryError;

/// Failure talking to the key-value store backing distributed locks
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// Transport or store failure; acquisition is aborted, not retried
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The wait bound elapsed before any poll was granted
    #[error("timed out after {waited:?} waiting for '{key}'")]
    Timeout { key: String, waited: Duration },

    #[error("invalid lock options: {0}")]
    InvalidOptions(String),
}

impl LockError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}

impl From<LockError> for InventoryError {
    fn from(value: LockError) -> Self {
        match value {
            LockError::Store(e) => InventoryError::StoreUnavailable(e.to_string()),
            LockError::Timeout { key, .. } => InventoryError::LockTimeout(key),
            LockError::InvalidOptions(message) => InventoryError::IllegalArgument(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_inventory_error() {
        let store: InventoryError = LockError::from(StoreError::Unavailable("refused".into())).into();
        assert_eq!(
            store,
            InventoryError::StoreUnavailable("lock store unavailable: refused".into())
        );

        let timeout: InventoryError = LockError::Timeout {
            key: "lock:medicine:aspirin".into(),
            waited: Duration::from_secs(10),
        }
        .into();
        assert_eq!(
            timeout,
            InventoryError::LockTimeout("lock:medicine:aspirin".into())
        );
        assert_eq!(timeout.status(), 409);
    }

    #[test]
    fn test_is_timeout() {
        let err = LockError::Timeout {
            key: "k".into(),
            waited: Duration::ZERO,
        };
        assert!(err.is_timeout());
        assert!(!LockError::InvalidOptions("x".into()).is_timeout());
    }
}
