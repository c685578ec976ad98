// Benchmarks for the uncontended lock paths
// Measures local slot churn and distributed acquire/release against the memory store

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use dispensary_consistency::{DistributedLock, LocalGuard, LockKey, MemoryLockStore};

const TTL: Duration = Duration::from_secs(5);

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_medicine_key(c: &mut Criterion) {
    c.bench_function("lock_key_medicine", |b| {
        b.iter(|| black_box(LockKey::medicine(black_box("  Paracetamol 500mg "))))
    });
}

fn bench_local_acquire_release(c: &mut Criterion) {
    let rt = runtime();
    let guard = LocalGuard::new();

    c.bench_function("local_acquire_release", |b| {
        b.to_async(&rt).iter(|| async {
            let permit = guard.acquire("lock:medicine:paracetamol", TTL).await;
            drop(black_box(permit));
        })
    });
}

fn bench_distributed_acquire_release(c: &mut Criterion) {
    let rt = runtime();
    let lock = DistributedLock::new(Arc::new(MemoryLockStore::new()));
    let key = LockKey::medicine("Paracetamol");

    c.bench_function("distributed_acquire_release", |b| {
        b.to_async(&rt).iter(|| async {
            if let Some(token) = lock.try_acquire(&key, TTL).await.unwrap() {
                black_box(lock.release(&key, &token).await.unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_medicine_key,
    bench_local_acquire_release,
    bench_distributed_acquire_release,
);
criterion_main!(benches);
