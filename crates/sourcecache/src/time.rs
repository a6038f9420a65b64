// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Wall-clock access for cache timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

use tick::{Clock, runtime::InactiveClock};

/// Supplies the current wall-clock time in milliseconds since the UNIX epoch.
///
/// Implemented for [`tick::Clock`], so a clock created from a `tick::ClockControl` gives tests
/// full control over cache ages. Closures returning `i64` qualify too:
///
/// ```
/// use sourcecache::TimeProvider;
///
/// let frozen = || 1_000_i64;
/// assert_eq!(frozen.now_millis(), 1_000);
/// ```
pub trait TimeProvider: Send + Sync {
    /// Returns the current time in milliseconds since the UNIX epoch.
    fn now_millis(&self) -> i64;
}

impl<F> TimeProvider for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now_millis(&self) -> i64 {
        self()
    }
}

/// A time before the UNIX epoch reads as negative milliseconds.
impl TimeProvider for Clock {
    fn now_millis(&self) -> i64 {
        unix_millis(self.system_time())
    }
}

/// A clock reading the system time. Its timers are never driven; only the time is read.
pub(crate) fn system_clock() -> Clock {
    let (clock, _driver) = InactiveClock::default().activate();
    clock
}

fn unix_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |millis| -millis),
    }
}
