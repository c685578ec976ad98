//! Coordinator behaviour against a recording, fault-injecting store

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dispensary_consistency::{
    LockCoordinator, LockError, LockKey, LockOptions, LockStore, MemoryLockStore, StoreError,
};

/// Wraps the memory store, counting calls and tracking concurrent holders
#[derive(Default)]
struct RecordingStore {
    inner: MemoryLockStore,
    calls: AtomicUsize,
    holders: AtomicUsize,
    max_holders: AtomicUsize,
    fail_next: AtomicBool,
}

impl RecordingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn enter(&self) {
        let now = self.holders.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_holders.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LockStore for RecordingStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected".to_string()));
        }
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_if_equals(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}

fn fast_options() -> LockOptions {
    LockOptions::default()
        .with_ttl(Duration::from_secs(5))
        .with_max_wait(Duration::from_secs(10))
        .with_poll_interval(Duration::from_millis(5))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mutual_exclusion_across_processes() {
    let store = Arc::new(RecordingStore::default());
    // Two coordinators sharing one store behave like two server processes
    let a = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let b = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Paracetamol");

    let mut tasks = Vec::new();
    for i in 0..16 {
        let coordinator = if i % 2 == 0 { a.clone() } else { b.clone() };
        let store = store.clone();
        let key = key.clone();
        tasks.push(tokio::spawn(async move {
            coordinator
                .with_resource_lock(&key, || async move {
                    store.enter();
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    store.leave();
                    Ok::<_, LockError>(())
                })
                .await
        }));
    }

    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.max_holders.load(Ordering::SeqCst), 1);
    assert_eq!(a.stats().acquisitions + b.stats().acquisitions, 16);
    assert_eq!(a.local().tracked_keys(), 0);
    assert_eq!(b.local().tracked_keys(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_store_error_does_not_wedge_local_slot() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    store.fail_next();
    let err = coordinator.acquire(&key).await.err().unwrap();
    assert!(matches!(err, LockError::Store(_)));
    assert_eq!(store.calls(), 1);
    assert_eq!(coordinator.local().tracked_keys(), 0);

    let handle = coordinator.acquire(&key).await.unwrap();
    assert!(handle.release().await.unwrap());
    assert_eq!(coordinator.stats().store_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_release_allows_immediate_reacquire() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    let first = coordinator.acquire(&key).await.unwrap();
    first.release().await.unwrap();

    let second = coordinator.acquire(&key).await.unwrap();
    second.release().await.unwrap();
    assert_eq!(coordinator.stats().busy_polls, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_no_local_slot() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");
    store
        .inner
        .set_if_absent(key.as_str(), "elsewhere", Duration::from_secs(60))
        .await
        .unwrap();

    let options = fast_options().with_max_wait(Duration::from_millis(50));
    let err = coordinator
        .acquire_with_timeout(&key, &options)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, LockError::Timeout { ref key, .. } if key == "lock:medicine:ibuprofen"));
    assert!(!coordinator.local().is_held(key.as_str()));
    assert_eq!(coordinator.local().tracked_keys(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_wins_tie_with_tick() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    let options = fast_options()
        .with_max_wait(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(100));
    let err = coordinator
        .acquire_with_timeout(&key, &options)
        .await
        .err()
        .unwrap();

    assert!(err.is_timeout());
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_waits_one_interval() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), LockOptions::default()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    let start = tokio::time::Instant::now();
    let handle = coordinator.acquire(&key).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));

    handle.release().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_expired_holder_release_is_counted_as_lost() {
    let store = Arc::new(RecordingStore::default());
    let a = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let b = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    let short = fast_options().with_ttl(Duration::from_millis(200));
    let stale = a.acquire_with_timeout(&key, &short).await.unwrap();

    // Entry expires while `stale` is still running; another process takes it
    let current = b.acquire(&key).await.unwrap();
    assert!(stale.held_for() >= Duration::from_millis(200));

    assert!(!stale.release().await.unwrap());
    assert_eq!(a.stats().lost_releases, 1);
    assert_eq!(
        store.inner.value_of(key.as_str()).as_deref(),
        Some(current.token().as_str())
    );

    assert!(current.release().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_business_error_still_releases() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    #[derive(Debug, PartialEq)]
    enum Failure {
        Lock,
        Business,
    }
    impl From<LockError> for Failure {
        fn from(_: LockError) -> Self {
            Failure::Lock
        }
    }

    let result: Result<(), Failure> = coordinator
        .with_resource_lock(&key, || async { Err(Failure::Business) })
        .await;

    assert_eq!(result, Err(Failure::Business));
    assert!(store.inner.is_empty());
    assert_eq!(coordinator.stats().releases, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panic_in_critical_section_releases_in_background() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");

    let task = {
        let coordinator = coordinator.clone();
        let key = key.clone();
        let fail = true;
        tokio::spawn(async move {
            coordinator
                .with_resource_lock(&key, || async move {
                    if fail {
                        panic!("critical section failed");
                    }
                    Ok::<(), LockError>(())
                })
                .await
        })
    };
    assert!(task.await.unwrap_err().is_panic());

    let reacquired = tokio::time::timeout(Duration::from_secs(2), coordinator.acquire(&key))
        .await
        .expect("lock should be released after panic")
        .unwrap();
    reacquired.release().await.unwrap();
    assert_eq!(coordinator.stats().releases, 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_release_frees_foreign_entry() {
    let store = Arc::new(RecordingStore::default());
    let coordinator = LockCoordinator::new(store.clone(), fast_options()).unwrap();
    let key = LockKey::medicine("Ibuprofen");
    store
        .inner
        .set_if_absent(key.as_str(), "crashed-process", Duration::from_secs(60))
        .await
        .unwrap();

    coordinator.force_release(&key).await.unwrap();

    let handle = coordinator.acquire(&key).await.unwrap();
    handle.release().await.unwrap();
}
