// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Demonstrates a `CachedSource` in front of a slow lookup.
//!
//! Five tasks ask for the same profile at once and share a single source call. Later requests
//! are served from the cache, and an observer sees every fresh result.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::StreamExt;
use sourcecache::{CacheRequirement, CachedSource, FromCache};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let profiles = Arc::new(
        CachedSource::builder(move |user: &'static str| {
            let counter = Arc::clone(&counter);
            async move {
                let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                println!("  source call #{call} for {user}");

                // Simulate a slow database query
                tokio::time::sleep(Duration::from_millis(300)).await;

                Ok::<_, String>(format!("Profile({user}, revision {call})"))
            }
        })
        .capacity(32)
        .build()?,
    );

    let mut updates = profiles.updates();

    println!("Starting 5 concurrent requests for alice...\n");

    let mut handles = Vec::new();
    for i in 1..=5 {
        let profiles = Arc::clone(&profiles);
        handles.push(tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let profile = profiles.fetch("alice", FromCache::Never, CacheRequirement::new()).await;
            println!("  [request {i}] got {profile:?} in {:?}", start.elapsed());
        }));
    }

    for handle in handles {
        handle.await?;
    }

    println!("\nSource calls so far: {}", calls.load(Ordering::SeqCst));

    if let Some((user, result)) = updates.next().await {
        println!("Observer saw {user}: {} (from cache: {})", result.value(), result.from_cache());
    }

    let fresh = CacheRequirement::new().with_max_age(Duration::from_secs(60));
    let cached = profiles.fetch("alice", FromCache::IfHave, fresh).await;
    println!("Cached read: {cached:?}");

    println!("\nCached value first, then a refresh:");
    let mut refreshed = profiles.get("alice", FromCache::CachedThenLoad, fresh);
    while let Some(profile) = refreshed.next().await {
        println!("  {profile:?}");
    }

    println!("\nTotal source calls: {}", calls.load(Ordering::SeqCst));

    Ok(())
}
