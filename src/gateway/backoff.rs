//! Backoff clock: a single "available again at" instant.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks the instant until which outbound calls are paused.
///
/// The stored instant is never proactively cleared; expiry is a read-side
/// check against the current time. `set_backoff` overwrites unconditionally,
/// so a shorter hint from upstream shrinks an existing wait.
#[derive(Debug, Clone, Default)]
pub struct BackoffClock {
    until: Option<Instant>,
}

impl BackoffClock {
    pub fn new() -> Self {
        Self { until: None }
    }

    /// True while a stored instant lies in the future.
    pub fn is_blocked(&self) -> bool {
        self.until.map(|t| t > Instant::now()).unwrap_or(false)
    }

    /// Seconds left until the clock unblocks, rounded up.
    ///
    /// `None` when no backoff is active.
    pub fn remaining_secs(&self) -> Option<u64> {
        let until = self.until?;
        let now = Instant::now();
        if until <= now {
            return None;
        }
        let remaining = until - now;
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        Some(secs)
    }

    /// Open (or replace) a backoff window of `seconds` from now.
    pub fn set_backoff(&mut self, seconds: u64) {
        self.until = Some(Instant::now() + Duration::from_secs(seconds));
    }
}
