//! Lock Data Model

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use dispensary_common::{LOCK_KEY_PREFIX, MEDICINE_RESOURCE};

use super::error::LockError;

pub const DEFAULT_LOCK_TTL_MS: u64 = 5000;
pub const DEFAULT_MAX_WAIT_MS: u64 = 10000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Identifies a guarded resource (`lock:<resource-type>:<resource-identifier>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockKey(String);

impl LockKey {
    pub fn new(resource_type: &str, resource_id: &str) -> Self {
        Self(format!("{}:{}:{}", LOCK_KEY_PREFIX, resource_type, resource_id))
    }

    /// Key guarding a medicine row.
    ///
    /// Medicine names match case-insensitively, so the key is built from the
    /// trimmed, lower-cased name.
    pub fn medicine(name: &str) -> Self {
        Self::new(MEDICINE_RESOURCE, &name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Holder identity written as the distributed entry's value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timing parameters for one acquisition
///
/// `ttl` bounds both the distributed entry and the local slot. It must exceed the
/// worst-case duration of the critical section, otherwise the lock can expire
/// underneath a running holder and admit a second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    pub ttl: Duration,
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self::from_millis(
            DEFAULT_LOCK_TTL_MS,
            DEFAULT_MAX_WAIT_MS,
            DEFAULT_POLL_INTERVAL_MS,
        )
    }
}

impl LockOptions {
    pub fn from_millis(ttl_ms: u64, max_wait_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            ttl: Duration::from_millis(ttl_ms),
            max_wait: Duration::from_millis(max_wait_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.ttl.is_zero() {
            return Err(LockError::InvalidOptions("ttl must be positive".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(LockError::InvalidOptions(
                "poll interval must be positive".to_string(),
            ));
        }

        let now = Instant::now();
        for (name, value) in [
            ("ttl", self.ttl),
            ("max wait", self.max_wait),
            ("poll interval", self.poll_interval),
        ] {
            if now.checked_add(value).is_none() {
                return Err(LockError::InvalidOptions(format!(
                    "{} of {:?} is out of range",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Lock statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStats {
    /// Handles granted
    pub acquisitions: u64,
    /// Acquisitions abandoned after the wait bound
    pub timeouts: u64,
    /// Store failures during acquisition or release
    pub store_errors: u64,
    /// Poll ticks that found the resource held
    pub busy_polls: u64,
    /// Handles released with their entry still owned
    pub releases: u64,
    /// Handles whose entry had already expired or changed hands at release
    pub lost_releases: u64,
}

#[derive(Default)]
pub(crate) struct LockStatsCollector {
    pub(crate) acquisitions: AtomicU64,
    pub(crate) timeouts: AtomicU64,
    pub(crate) store_errors: AtomicU64,
    pub(crate) busy_polls: AtomicU64,
    pub(crate) releases: AtomicU64,
    pub(crate) lost_releases: AtomicU64,
}

impl LockStatsCollector {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            busy_polls: self.busy_polls.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            lost_releases: self.lost_releases.load(Ordering::Relaxed),
        }
    }
}
