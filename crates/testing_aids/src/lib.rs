// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An unpublished crate containing testing utilities for use within this repo.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod log;

pub use log::*;

/// If something (whatever) does not happen in a test within this time, the test will fail.
///
/// We are conservative here and allow much time - this is only to break out of deadlocks and
/// lost wakeups, not for any situations that are actually expected.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Awaits `f`, failing the test if it does not complete within [`TEST_TIMEOUT`].
///
/// Must be called from within a Tokio runtime with the time driver enabled.
///
/// # Panics
///
/// Panics if the timeout is exceeded.
pub async fn within_timeout<F: Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(output) => output,
        Err(_) => panic!("test did not complete within {TEST_TIMEOUT:?}"),
    }
}

/// Executes an async function on the `futures` executor, blocking until it completes.
///
/// For tests whose futures never wait on timers or I/O.
pub fn block_on<F: Future>(f: F) -> F::Output {
    ::futures::executor::block_on(f)
}

/// Shared invocation counter for fake sources.
///
/// Clones share the same count, so a clone can be moved into a `'static` closure while the
/// test keeps another to assert on.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicUsize>,
}

impl Counter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count and returns the new value, so the first call returns 1.
    pub fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Returns the current count.
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
