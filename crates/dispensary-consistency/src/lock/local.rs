//! Process-local exclusion keyed by lock key.
//!
//! Slots are reference counted and removed once nobody holds or awaits them, so
//! the table is bounded by concurrently contended keys rather than by every key
//! ever seen. Each holder carries a deadline: a waiter that finds the holder past
//! it takes the slot over, so a leaked permit cannot wedge a key for the rest of
//! the process lifetime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

type SlotTable = Arc<DashMap<String, Arc<Slot>>>;

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    released: Notify,
}

#[derive(Default)]
struct SlotState {
    holder: Option<Holder>,
    /// Contexts currently holding or waiting on the slot
    refs: usize,
}

#[derive(Clone, Copy)]
struct Holder {
    id: u64,
    /// `None` when the hold limit does not fit on the clock; held until released
    deadline: Option<Instant>,
}

impl Holder {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| deadline > now)
    }
}

/// Per-process lock table
#[derive(Default)]
pub struct LocalGuard {
    slots: SlotTable,
    next_holder_id: AtomicU64,
}

impl LocalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the slot for `key` is free and take it.
    ///
    /// Never fails. The wait is bounded by the current holder's deadline, after
    /// which that holder is force-expired. `hold_limit` becomes this caller's
    /// own deadline; a limit past the end of the clock means no deadline.
    pub async fn acquire(&self, key: &str, hold_limit: Duration) -> LocalPermit {
        let slot_ref = self.checkout(key);
        let id = self.next_holder_id.fetch_add(1, Ordering::Relaxed);

        loop {
            // Created before the state check so a release in between still wakes us
            let released = slot_ref.slot.released.notified();

            let wait = {
                let mut state = slot_ref.slot.state.lock();
                let now = Instant::now();
                match state.holder {
                    Some(holder) if holder.is_live(now) => {
                        holder.deadline.map(|deadline| deadline - now)
                    }
                    previous => {
                        if previous.is_some() {
                            warn!(key = %key, "Local lock holder exceeded its deadline, forcing expiry");
                        }
                        state.holder = Some(Holder {
                            id,
                            deadline: now.checked_add(hold_limit),
                        });
                        break;
                    }
                }
            };

            match wait {
                Some(remaining) => {
                    let _ = tokio::time::timeout(remaining, released).await;
                }
                None => released.await,
            }
        }

        debug!(key = %key, "Local lock acquired");
        LocalPermit { slot_ref, id }
    }

    /// Whether `key` currently has a live holder in this process
    pub fn is_held(&self, key: &str) -> bool {
        self.slots.get(key).is_some_and(|slot| {
            slot.state
                .lock()
                .holder
                .is_some_and(|holder| holder.is_live(Instant::now()))
        })
    }

    /// Number of keys with a holder or waiter
    pub fn tracked_keys(&self) -> usize {
        self.slots.len()
    }

    fn checkout(&self, key: &str) -> SlotRef {
        let slot = {
            let entry = self.slots.entry(key.to_string()).or_default();
            entry.state.lock().refs += 1;
            entry.value().clone()
        };
        SlotRef {
            slots: self.slots.clone(),
            key: key.to_string(),
            slot,
        }
    }
}

/// Counted reference to a slot; the last one out removes the slot from the table
struct SlotRef {
    slots: SlotTable,
    key: String,
    slot: Arc<Slot>,
}

impl Drop for SlotRef {
    fn drop(&mut self) {
        let idle = {
            let mut state = self.slot.state.lock();
            state.refs -= 1;
            state.refs == 0
        };
        if idle {
            self.slots.remove_if(&self.key, |_, slot| {
                Arc::ptr_eq(slot, &self.slot) && slot.state.lock().refs == 0
            });
        }
    }
}

/// Exclusive ownership of a local slot, released on drop
pub struct LocalPermit {
    slot_ref: SlotRef,
    id: u64,
}

impl LocalPermit {
    pub fn key(&self) -> &str {
        &self.slot_ref.key
    }
}

impl Drop for LocalPermit {
    fn drop(&mut self) {
        let still_held = {
            let mut state = self.slot_ref.slot.state.lock();
            if state.holder.is_some_and(|holder| holder.id == self.id) {
                state.holder = None;
                true
            } else {
                false
            }
        };

        if still_held {
            debug!(key = %self.slot_ref.key, "Local lock released");
        } else {
            warn!(key = %self.slot_ref.key, "Local lock was force-expired before release");
        }
        self.slot_ref.slot.released.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_acquire_release_cleans_up_slot() {
        let guard = LocalGuard::new();

        let permit = guard.acquire("lock:medicine:a", HOLD).await;
        assert_eq!(permit.key(), "lock:medicine:a");
        assert!(guard.is_held("lock:medicine:a"));
        assert_eq!(guard.tracked_keys(), 1);

        drop(permit);
        assert!(!guard.is_held("lock:medicine:a"));
        assert_eq!(guard.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let guard = LocalGuard::new();

        let _a = guard.acquire("lock:medicine:a", HOLD).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            guard.acquire("lock:medicine:b", HOLD),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(guard.tracked_keys(), 2);
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_release() {
        let guard = Arc::new(LocalGuard::new());
        let first = guard.acquire("k", HOLD).await;

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move {
                let _permit = guard.acquire("k", HOLD).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken by release")
            .unwrap();
        assert_eq!(guard.tracked_keys(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_holder_is_force_expired() {
        let guard = LocalGuard::new();
        let start = Instant::now();

        let stale = guard.acquire("k", Duration::from_millis(500)).await;
        let fresh = guard.acquire("k", HOLD).await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        // The stale holder's release must not free the new holder's slot
        drop(stale);
        assert!(guard.is_held("k"));

        drop(fresh);
        assert!(!guard.is_held("k"));
        assert_eq!(guard.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_unbounded_hold_limit_holds_until_release() {
        let guard = Arc::new(LocalGuard::new());
        let permit = guard.acquire("k", Duration::MAX).await;
        assert!(guard.is_held("k"));

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move {
                let _permit = guard.acquire("k", HOLD).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(permit);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken by release")
            .unwrap();
        assert_eq!(guard.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_its_reference() {
        let guard = Arc::new(LocalGuard::new());
        let holder = guard.acquire("k", HOLD).await;

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move {
                let _permit = guard.acquire("k", HOLD).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();
        let _ = waiter.await;

        drop(holder);
        assert_eq!(guard.tracked_keys(), 0);
    }
}
