use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;

/// Every "now" used by schedule resolution (§4.E.6), idempotent-transition
/// checks (§4.E.3/§4.E.5), and OS-update-run timestamps goes through this
/// trait so tests can pin time instead of racing the wall clock.
pub trait Clock: Send + Sync {
    /// Current time as Unix seconds.
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock pinned to a fixed instant, adjustable in place. Used by tests
/// that assert against the scenario table in spec §8 (e.g. S1's
/// `now = 1_000_000`).
#[derive(Debug, Clone)]
pub struct FixedClock {
    unix: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn new(unix: i64) -> Self {
        Self { unix: Arc::new(AtomicI64::new(unix)) }
    }

    pub fn set(&self, unix: i64) {
        self.unix.store(unix, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_seconds: i64) {
        self.unix.fetch_add(delta_seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.unix.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_holds_value_until_advanced() {
        let clock = FixedClock::new(1_000_000);
        assert_eq!(clock.now_unix(), 1_000_000);
        clock.advance(60);
        assert_eq!(clock.now_unix(), 1_000_060);
        clock.set(42);
        assert_eq!(clock.now_unix(), 42);
    }
}
