// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the cache modes of `CachedSource`.

use std::time::Duration;

use futures::{FutureExt, StreamExt, future::BoxFuture};
use sourcecache::{CacheRequirement, CacheStore, CachedSource, CachedSourceResult, Error, FromCache};
use testing_aids::{Counter, within_timeout};
use tick::ClockControl;

const START: i64 = 1_000;

type Source = CachedSource<&'static str, usize, String>;

/// Returns 1, 2, 3, ... on successive calls.
fn counting(counter: &Counter) -> impl Fn(&'static str) -> BoxFuture<'static, Result<usize, String>> + Send + Sync + 'static {
    let counter = counter.clone();
    move |_| {
        let counter = counter.clone();
        async move { Ok(counter.increment()) }.boxed()
    }
}

/// Succeeds with the call number on odd calls, fails on even calls.
fn flaky(counter: &Counter) -> impl Fn(&'static str) -> BoxFuture<'static, Result<usize, String>> + Send + Sync + 'static {
    let counter = counter.clone();
    move |_| {
        let counter = counter.clone();
        async move {
            let call = counter.increment();
            if call % 2 == 1 { Ok(call) } else { Err(format!("call {call} failed")) }
        }
        .boxed()
    }
}

fn build(source: impl Fn(&'static str) -> BoxFuture<'static, Result<usize, String>> + Send + Sync + 'static) -> (Source, ClockControl) {
    testing_aids::log_to_stdout();

    let clock = ClockControl::new_at(std::time::UNIX_EPOCH + Duration::from_millis(START.unsigned_abs()));
    let source = CachedSource::builder(source)
        .capacity(16)
        .time_provider(clock.to_clock())
        .build()
        .expect("valid configuration");
    (source, clock)
}

async fn collect_raw(source: &Source, params: &'static str, mode: FromCache, requirement: CacheRequirement) -> Vec<Result<CachedSourceResult<usize>, Error<String>>> {
    within_timeout(source.get_raw(params, mode, requirement).collect()).await
}

fn max_age(millis: u64) -> CacheRequirement {
    CacheRequirement::new().with_max_age(Duration::from_millis(millis))
}

#[tokio::test]
async fn never_always_calls_source() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    assert_eq!(collect_raw(&source, "x", FromCache::Never, CacheRequirement::new()).await, vec![Ok(CachedSourceResult::new(1, false, Some(START)))]);
    assert_eq!(collect_raw(&source, "x", FromCache::Never, CacheRequirement::new()).await, vec![Ok(CachedSourceResult::new(2, false, Some(START)))]);
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn cache_round_trip_keeps_origin_timestamp() {
    let counter = Counter::new();
    let (source, clock) = build(counting(&counter));

    let _ = collect_raw(&source, "x", FromCache::Never, CacheRequirement::new()).await;
    clock.advance(Duration::from_secs(5));

    let cached = collect_raw(&source, "x", FromCache::Only, CacheRequirement::new()).await;
    assert_eq!(cached, vec![Ok(CachedSourceResult::new(1, true, Some(START)))]);
    assert_eq!(counter.get(), 1);
}

#[tokio::test]
async fn only_with_empty_cache_fails_without_calling_source() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let result = source.fetch("x", FromCache::Only, CacheRequirement::new()).await;
    assert_eq!(result, Err(Error::NotCached));
    assert_eq!(counter.get(), 0);
    assert_eq!(source.ongoing_request_count(), 0);
}

#[tokio::test]
async fn only_rejects_stale_entry() {
    let counter = Counter::new();
    let (source, clock) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;
    clock.advance(Duration::from_millis(100));

    assert_eq!(source.fetch("x", FromCache::Only, max_age(100)).await, Err(Error::NotCached));
    assert_eq!(source.fetch("x", FromCache::Only, max_age(101)).await, Ok(1));
    assert_eq!(counter.get(), 1);
}

#[tokio::test]
async fn entry_aged_exactly_max_age_is_stale() {
    let counter = Counter::new();
    let (source, clock) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;

    clock.advance(Duration::from_millis(999));
    let fresh = collect_raw(&source, "x", FromCache::IfHave, max_age(1_000)).await;
    assert_eq!(fresh, vec![Ok(CachedSourceResult::new(1, true, Some(START)))]);

    clock.advance(Duration::from_millis(1));
    let reloaded = collect_raw(&source, "x", FromCache::IfHave, max_age(1_000)).await;
    assert_eq!(reloaded, vec![Ok(CachedSourceResult::new(2, false, Some(START + 1_000)))]);
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn if_have_serves_cache_then_loads_on_miss() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    assert_eq!(source.fetch("x", FromCache::IfHave, CacheRequirement::new()).await, Ok(1));
    assert_eq!(source.fetch("x", FromCache::IfHave, CacheRequirement::new()).await, Ok(1));
    assert_eq!(source.fetch("y", FromCache::IfHave, CacheRequirement::new()).await, Ok(2));
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn if_failed_falls_back_to_cache() {
    let counter = Counter::new();
    let (source, _) = build(flaky(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;

    let fallback = collect_raw(&source, "x", FromCache::IfFailed, CacheRequirement::new()).await;
    assert_eq!(fallback, vec![Ok(CachedSourceResult::new(1, true, Some(START)))]);
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn if_failed_prefers_fresh_source_value() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;

    let loaded = collect_raw(&source, "x", FromCache::IfFailed, CacheRequirement::new()).await;
    assert_eq!(loaded, vec![Ok(CachedSourceResult::new(2, false, Some(START)))]);
}

#[tokio::test]
async fn if_failed_without_cache_propagates_original_error() {
    let counter = Counter::new();
    // Burn the first (successful) call on another key so "x" fails next.
    let (source, _) = build(flaky(&counter));
    let _ = source.fetch("other", FromCache::Never, CacheRequirement::new()).await;
    source.clear_cache().await;

    let result = source.fetch("x", FromCache::IfFailed, CacheRequirement::new()).await;
    assert_eq!(result, Err(Error::Source("call 2 failed".to_string())));
}

#[tokio::test]
async fn if_failed_ignores_stale_fallback() {
    let counter = Counter::new();
    let (source, clock) = build(flaky(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;
    clock.advance(Duration::from_secs(10));

    let result = source.fetch("x", FromCache::IfFailed, max_age(1_000)).await;
    assert_eq!(result, Err(Error::Source("call 2 failed".to_string())));
}

#[tokio::test]
async fn cached_then_load_emits_cached_first() {
    let counter = Counter::new();
    let (source, clock) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;
    clock.advance(Duration::from_millis(10));

    let items = collect_raw(&source, "x", FromCache::CachedThenLoad, CacheRequirement::new()).await;
    assert_eq!(
        items,
        vec![
            Ok(CachedSourceResult::new(1, true, Some(START))),
            Ok(CachedSourceResult::new(2, false, Some(START + 10))),
        ]
    );
}

#[tokio::test]
async fn cached_then_load_without_cache_loads_once() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let items = collect_raw(&source, "x", FromCache::CachedThenLoad, CacheRequirement::new()).await;
    assert_eq!(items, vec![Ok(CachedSourceResult::new(1, false, Some(START)))]);
}

#[tokio::test]
async fn cached_then_load_emits_cached_then_failure() {
    let counter = Counter::new();
    let (source, _) = build(flaky(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;

    let first = collect_raw(&source, "x", FromCache::CachedThenLoad, CacheRequirement::new()).await;
    assert_eq!(
        first,
        vec![
            Ok(CachedSourceResult::new(1, true, Some(START))),
            Err(Error::Source("call 2 failed".to_string())),
        ]
    );

    let second = collect_raw(&source, "x", FromCache::CachedThenLoad, CacheRequirement::new()).await;
    assert_eq!(
        second,
        vec![
            Ok(CachedSourceResult::new(1, true, Some(START))),
            Ok(CachedSourceResult::new(3, false, Some(START))),
        ]
    );
}

#[tokio::test]
async fn get_yields_plain_values() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;
    let values: Vec<_> = source.get("x", FromCache::CachedThenLoad, CacheRequirement::new()).collect().await;
    assert_eq!(values, vec![Ok(1), Ok(2)]);
}

#[tokio::test]
async fn streams_are_lazy() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let stream = source.get("x", FromCache::Never, CacheRequirement::new());
    assert_eq!(counter.get(), 0);
    drop(stream);
    assert_eq!(counter.get(), 0);
    assert_eq!(source.ongoing_request_count(), 0);
}

#[tokio::test]
async fn clear_cache_empties_store() {
    let counter = Counter::new();
    let (source, _) = build(counting(&counter));

    let _ = source.fetch("x", FromCache::Never, CacheRequirement::new()).await;
    source.clear_cache().await;

    assert_eq!(source.fetch("x", FromCache::Only, CacheRequirement::new()).await, Err(Error::NotCached));
    assert_eq!(source.fetch("x", FromCache::IfHave, CacheRequirement::new()).await, Ok(2));
}

#[tokio::test]
async fn default_store_keeps_one_entry() {
    let counter = Counter::new();
    let source = CachedSource::new(counting(&counter));

    let _ = source.fetch("a", FromCache::Never, CacheRequirement::new()).await;
    let _ = source.fetch("b", FromCache::Never, CacheRequirement::new()).await;

    assert_eq!(source.fetch("a", FromCache::Only, CacheRequirement::new()).await, Err(Error::NotCached));
    assert_eq!(source.fetch("b", FromCache::Only, CacheRequirement::new()).await, Ok(2));
    assert_eq!(source.store().len(), Some(1));
}

#[tokio::test]
async fn panicking_source_is_reported() {
    let source = CachedSource::new(|_: u8| async {
        panic!("source exploded");
        #[expect(unreachable_code, reason = "Required to satisfy return type after panic")]
        Ok::<u8, String>(0)
    });

    match source.fetch(1, FromCache::Never, CacheRequirement::new()).await {
        Err(Error::Panicked(panicked)) => assert_eq!(panicked.message(), "source exploded"),
        other => panic!("expected a panic error, got {other:?}"),
    }
    assert_eq!(source.ongoing_request_count(), 0);
}

#[tokio::test]
async fn if_failed_falls_back_after_panic() {
    let counter = Counter::new();
    let calls = counter.clone();
    let source = CachedSource::new(move |_: u8| {
        let calls = calls.clone();
        async move {
            assert!(calls.increment() == 1, "only the first call succeeds");
            Ok::<_, String>(10)
        }
    });

    let _ = source.fetch(1, FromCache::Never, CacheRequirement::new()).await;
    let result = source.fetch(1, FromCache::IfFailed, CacheRequirement::new()).await;

    assert_eq!(result, Ok(10));
    assert_eq!(counter.get(), 2);
}

#[tokio::test]
async fn unkeyed_source_caches_latest() {
    let counter = Counter::new();
    let calls = counter.clone();
    let source = CachedSource::unkeyed(move || {
        let calls = calls.clone();
        async move { Ok::<_, String>(calls.increment()) }
    });

    let first: Vec<_> = source.get_unkeyed(FromCache::IfHave, CacheRequirement::new()).collect().await;
    let second: Vec<_> = source.get_unkeyed(FromCache::IfHave, CacheRequirement::new()).collect().await;

    assert_eq!(first, vec![Ok(1)]);
    assert_eq!(second, vec![Ok(1)]);
    assert_eq!(counter.get(), 1);
    assert!(source.get_unkeyed(FromCache::Never, CacheRequirement::new()).next().now_or_never().is_some());
}
