//! Cross-process exclusion over a shared [`LockStore`]

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::StoreError;
use super::model::{LockKey, LockToken};
use super::store::LockStore;

/// Single-attempt distributed lock
///
/// Every acquisition writes a fresh holder token, and release only deletes the
/// entry while it still carries that token. A holder whose entry expired and was
/// taken over cannot delete the new holder's entry.
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn LockStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    /// One set-if-absent attempt; `Ok(None)` means another holder owns the key
    pub async fn try_acquire(
        &self,
        key: &LockKey,
        ttl: Duration,
    ) -> Result<Option<LockToken>, StoreError> {
        let token = LockToken::generate();
        let acquired = self
            .store
            .set_if_absent(key.as_str(), token.as_str(), ttl)
            .await?;

        if acquired {
            debug!(key = %key, "Distributed lock acquired");
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    /// Delete the entry if `token` still owns it.
    ///
    /// Returns `Ok(false)` when the entry had already expired or changed hands.
    pub async fn release(&self, key: &LockKey, token: &LockToken) -> Result<bool, StoreError> {
        let released = self
            .store
            .delete_if_equals(key.as_str(), token.as_str())
            .await?;

        if released {
            debug!(key = %key, "Distributed lock released");
        } else {
            warn!(key = %key, "Distributed lock entry expired or was taken over before release");
        }
        Ok(released)
    }

    /// Administrative removal of whatever entry exists for `key`
    pub async fn force_release(&self, key: &LockKey) -> Result<(), StoreError> {
        warn!(key = %key, "Force releasing distributed lock");
        self.store.delete(key.as_str()).await
    }
}
