//! Clock abstraction for testable freshness checks.
//!
//! The replay guard compares an embedded timestamp against "now"; injecting
//! the clock keeps that comparison deterministic under test, including the
//! inclusive boundary at exactly the tolerance window.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of the current time.
///
/// Production code uses [`RealClock`]; tests inject [`TestClock`] to pin
/// or advance time without sleeping.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current system time.
    fn now_system(&self) -> SystemTime;

    /// Returns the current Unix timestamp in whole seconds.
    fn unix_timestamp(&self) -> i64 {
        self.now_system()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Real clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Holds system time as nanoseconds since the Unix epoch in an atomic, so
/// clones share the same timeline and tests can advance it explicitly.
#[derive(Debug, Clone)]
pub struct TestClock {
    system_ns: Arc<AtomicU64>,
}

impl TestClock {
    /// Creates a test clock pinned to the current system time.
    pub fn new() -> Self {
        let since_epoch =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::at_nanos(u64::try_from(since_epoch.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0))
    }

    /// Creates a test clock pinned to a specific Unix timestamp in seconds.
    pub fn at_unix(seconds: u64) -> Self {
        Self::at_nanos(seconds.saturating_mul(1_000_000_000))
    }

    fn at_nanos(nanos: u64) -> Self {
        Self { system_ns: Arc::new(AtomicU64::new(nanos)) }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0);
        self.system_ns.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Pins the clock to a specific Unix timestamp in seconds.
    pub fn set_unix(&self, seconds: u64) {
        self.system_ns.store(seconds.saturating_mul(1_000_000_000), Ordering::SeqCst);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_system(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.system_ns.load(Ordering::SeqCst))
    }
}
