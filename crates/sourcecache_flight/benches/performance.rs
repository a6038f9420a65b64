// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Performance benchmarks for the deduplicator.
//!
//! Run with: cargo bench -p sourcecache_flight
//! Save baseline: cargo bench -p sourcecache_flight -- --save-baseline main
//! Compare to baseline: cargo bench -p sourcecache_flight -- --baseline main

#![allow(missing_docs, reason = "benchmark code")]

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use criterion::{Criterion, criterion_group, criterion_main};
use sourcecache_flight::Deduplicator;

static KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_key() -> String {
    format!("key_{}", KEY_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Baseline: single shared call, no contention.
fn bench_single_call(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let flights = Arc::new(Deduplicator::<String, String>::new());

    c.bench_function("single_call", |b| {
        b.to_async(&rt).iter(|| flights.run_shared(unique_key(), || async { "value".to_string() }));
    });
}

/// Baseline: the exclusive path, which skips the registry.
fn bench_exclusive_call(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let flights = Arc::new(Deduplicator::<String, String>::new());

    c.bench_function("exclusive_call", |b| {
        b.to_async(&rt).iter(|| {
            let flights = Arc::clone(&flights);
            async move { flights.run_exclusive(|| async { "value".to_string() }).await }
        });
    });
}

/// Stress test: 100 concurrent tasks on the same key.
fn bench_high_contention(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let flights = Arc::new(Deduplicator::<String, String>::new());

    c.bench_function("high_contention_100", |b| {
        b.to_async(&rt).iter(|| {
            let flights = Arc::clone(&flights);
            async move {
                let key = unique_key();
                let tasks: Vec<_> = (0..100)
                    .map(|_| tokio::spawn(flights.run_shared(key.clone(), || async { "value".to_string() })))
                    .collect();

                for task in tasks {
                    task.await.expect("Task panicked").expect("Producer panicked");
                }
            }
        });
    });
}

/// Distributed load: 10 keys with 10 concurrent tasks each.
fn bench_distributed_keys(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let flights = Arc::new(Deduplicator::<String, String>::new());

    c.bench_function("distributed_10x10", |b| {
        b.to_async(&rt).iter(|| {
            let flights = Arc::clone(&flights);
            async move {
                let prefix = KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
                let tasks: Vec<_> = (0..10)
                    .flat_map(|key_id| {
                        let key = format!("key_{prefix}_{key_id}");
                        (0..10)
                            .map(|_| tokio::spawn(flights.run_shared(key.clone(), || async { "value".to_string() })))
                            .collect::<Vec<_>>()
                    })
                    .collect();

                for task in tasks {
                    task.await.expect("Task panicked").expect("Producer panicked");
                }
            }
        });
    });
}

criterion_group!(
    benches,
    bench_single_call,
    bench_exclusive_call,
    bench_high_contention,
    bench_distributed_keys,
);

criterion_main!(benches);
