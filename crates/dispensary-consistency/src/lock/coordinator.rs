//! Bounded polling acquisition combining local and distributed exclusion

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::distributed::DistributedLock;
use super::error::{LockError, StoreError};
use super::local::{LocalGuard, LocalPermit};
use super::model::{LockKey, LockOptions, LockStats, LockStatsCollector, LockToken};
use super::store::LockStore;

/// Acquires joint ownership of a resource: the local slot in this process plus
/// the distributed entry shared with every other process.
#[derive(Clone)]
pub struct LockCoordinator {
    local: Arc<LocalGuard>,
    distributed: DistributedLock,
    options: LockOptions,
    stats: Arc<LockStatsCollector>,
}

impl LockCoordinator {
    pub fn new(store: Arc<dyn LockStore>, options: LockOptions) -> Result<Self, LockError> {
        options.validate()?;

        Ok(Self {
            local: Arc::new(LocalGuard::new()),
            distributed: DistributedLock::new(store),
            options,
            stats: Arc::new(LockStatsCollector::default()),
        })
    }

    /// Acquire `key` with the process-wide options
    pub async fn acquire(&self, key: &LockKey) -> Result<LockHandle, LockError> {
        self.acquire_with_timeout(key, &self.options).await
    }

    /// Poll for `key` every `poll_interval` until granted or `max_wait` elapses.
    ///
    /// The first attempt happens one interval after the call. When the deadline
    /// and a tick are ready together the deadline wins and `Timeout` is returned.
    /// Waiting for the local slot counts against the same deadline.
    /// A store error aborts the loop immediately. No local slot is held on any
    /// error path.
    pub async fn acquire_with_timeout(
        &self,
        key: &LockKey,
        options: &LockOptions,
    ) -> Result<LockHandle, LockError> {
        options.validate()?;

        let start = Instant::now();
        let deadline = tokio::time::sleep_until(start + options.max_wait);
        tokio::pin!(deadline);

        let mut ticker =
            tokio::time::interval_at(start + options.poll_interval, options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    return Err(self.timed_out(key, start));
                }
                _ = ticker.tick() => {
                    let local = self.local.acquire(key.as_str(), options.ttl);
                    let Ok(permit) = tokio::time::timeout_at(start + options.max_wait, local).await
                    else {
                        return Err(self.timed_out(key, start));
                    };

                    match self.distributed.try_acquire(key, options.ttl).await {
                        Ok(Some(token)) => {
                            LockStatsCollector::incr(&self.stats.acquisitions);
                            debug!(key = %key, waited_ms = start.elapsed().as_millis() as u64, "Resource lock granted");
                            return Ok(LockHandle {
                                key: key.clone(),
                                token,
                                permit: Some(permit),
                                distributed: self.distributed.clone(),
                                stats: self.stats.clone(),
                                acquired_at: Instant::now(),
                            });
                        }
                        Ok(None) => {
                            drop(permit);
                            LockStatsCollector::incr(&self.stats.busy_polls);
                            debug!(key = %key, "Resource busy, polling");
                        }
                        Err(e) => {
                            drop(permit);
                            LockStatsCollector::incr(&self.stats.store_errors);
                            warn!(key = %key, error = %e, "Lock store failed during acquisition");
                            return Err(e.into());
                        }
                    }
                }
            }
        }
    }

    fn timed_out(&self, key: &LockKey, start: Instant) -> LockError {
        LockStatsCollector::incr(&self.stats.timeouts);
        let waited = start.elapsed();
        warn!(key = %key, waited_ms = waited.as_millis() as u64, "Timed out waiting for resource lock");
        LockError::Timeout {
            key: key.to_string(),
            waited,
        }
    }

    /// Run `critical_section` while holding `key`, releasing on every exit path.
    ///
    /// A failed release is logged and does not replace the critical section's result.
    pub async fn with_resource_lock<T, E, F, Fut>(
        &self,
        key: &LockKey,
        critical_section: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let handle = self.acquire(key).await?;
        let result = critical_section().await;

        if let Err(e) = handle.release().await {
            warn!(key = %key, error = %e, "Failed to release resource lock");
        }
        result
    }

    /// Remove the distributed entry for `key` whoever holds it
    pub async fn force_release(&self, key: &LockKey) -> Result<(), LockError> {
        self.distributed.force_release(key).await?;
        Ok(())
    }

    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    pub fn local(&self) -> &LocalGuard {
        &self.local
    }

    pub fn distributed(&self) -> &DistributedLock {
        &self.distributed
    }
}

/// Joint ownership of a resource
///
/// Release with [`LockHandle::release`]. A handle dropped without it (panic,
/// cancellation) releases in a task spawned on the current runtime.
#[must_use = "a lock handle must be released"]
pub struct LockHandle {
    key: LockKey,
    token: LockToken,
    permit: Option<LocalPermit>,
    distributed: DistributedLock,
    stats: Arc<LockStatsCollector>,
    acquired_at: Instant,
}

impl LockHandle {
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Delete the distributed entry, then free the local slot.
    ///
    /// `Ok(false)` means the entry had already expired or changed hands; the
    /// local slot is freed either way.
    pub async fn release(mut self) -> Result<bool, StoreError> {
        let permit = self.permit.take();
        debug!(key = %self.key, held_ms = self.held_for().as_millis() as u64, "Releasing resource lock");
        release_parts(&self.distributed, &self.stats, &self.key, &self.token, permit).await
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(key = %self.key, "Lock handle dropped without release, releasing in background");
                let distributed = self.distributed.clone();
                let stats = self.stats.clone();
                let key = self.key.clone();
                let token = self.token.clone();
                runtime.spawn(async move {
                    if let Err(e) =
                        release_parts(&distributed, &stats, &key, &token, Some(permit)).await
                    {
                        error!(key = %key, error = %e, "Background lock release failed");
                    }
                });
            }
            Err(_) => {
                error!(key = %self.key, "No runtime to release dropped lock handle, distributed entry left to expire");
                drop(permit);
            }
        }
    }
}

async fn release_parts(
    distributed: &DistributedLock,
    stats: &LockStatsCollector,
    key: &LockKey,
    token: &LockToken,
    permit: Option<LocalPermit>,
) -> Result<bool, StoreError> {
    let result = distributed.release(key, token).await;
    drop(permit);

    match &result {
        Ok(true) => LockStatsCollector::incr(&stats.releases),
        Ok(false) => LockStatsCollector::incr(&stats.lost_releases),
        Err(_) => LockStatsCollector::incr(&stats.store_errors),
    }
    result
}
