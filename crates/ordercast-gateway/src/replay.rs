//! Replay protection for timestamped signature headers.
//!
//! Freshness is only enforceable when the header embeds a timestamp; the
//! simple `sha256=` format carries none, so those requests pass through.
//! A malformed `t=` value is governed by [`ReplayPolicy`]: the source
//! system fails open, and the flag exists so an operator can flip to
//! fail-closed without touching the verifier.

use std::{sync::Arc, time::Duration};

use ordercast_core::Clock;
use tracing::warn;

use crate::crypto::timestamp_component;

/// Default tolerance window for embedded timestamps, in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// What to do when a `t=` component is present but unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Let the request through. Availability over strictness.
    #[default]
    FailOpen,
    /// Reject the request.
    FailClosed,
}

/// Rejects requests whose embedded timestamp falls outside the tolerance
/// window around the injected clock's now.
#[derive(Debug, Clone)]
pub struct ReplayGuard {
    tolerance: Duration,
    policy: ReplayPolicy,
    clock: Arc<dyn Clock>,
}

impl ReplayGuard {
    /// Creates a guard with the default 300-second tolerance and the
    /// fail-open policy.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { tolerance: Duration::from_secs(DEFAULT_TOLERANCE_SECS), policy: ReplayPolicy::FailOpen, clock }
    }

    /// Overrides the tolerance window.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Overrides the malformed-timestamp policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the freshness of a signature header's embedded timestamp.
    ///
    /// Passes when the header is absent or carries no `t=` component.
    /// Otherwise passes iff `|now - t|` is at most the tolerance,
    /// inclusive at the boundary.
    pub fn is_fresh(&self, signature_header: Option<&str>) -> bool {
        let Some(header) = signature_header else {
            return true;
        };
        let Some(raw_timestamp) = timestamp_component(header) else {
            return true;
        };

        let Ok(timestamp) = raw_timestamp.parse::<i64>() else {
            warn!(policy = ?self.policy, "unparseable t= component in signature header");
            return self.policy == ReplayPolicy::FailOpen;
        };

        let skew = self.clock.unix_timestamp().saturating_sub(timestamp).unsigned_abs();
        skew <= self.tolerance.as_secs()
    }
}
