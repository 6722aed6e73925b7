use std::sync::atomic::{AtomicU64, Ordering};

use chronon_core::Nanos;
use chronon_ports::TimeSource;

/// Time source frozen at a fixed instant
///
/// Every sample returns the same value until [`set`](Self::set) is called.
/// Useful for deterministic tests of logical-counter behavior.
pub struct FixedTimeSource {
    now: AtomicU64,
}

impl FixedTimeSource {
    pub fn new(now: Nanos) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move the frozen clock to a new instant (backwards is allowed)
    pub fn set(&self, now: Nanos) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_nanos(&self) -> Nanos {
        self.now.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "FixedTimeSource"
    }
}

/// Time source that advances by a fixed step on every sample
///
/// Simulates a node whose clock runs at its own rate: different step sizes
/// on different nodes produce bounded relative skew without any real waiting.
pub struct SteppingTimeSource {
    next: AtomicU64,
    step: u64,
}

impl SteppingTimeSource {
    pub fn new(start: Nanos, step: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            step,
        }
    }
}

impl TimeSource for SteppingTimeSource {
    fn now_nanos(&self) -> Nanos {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "SteppingTimeSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_is_frozen() {
        let source = FixedTimeSource::new(1000);
        assert_eq!(source.now_nanos(), 1000);
        assert_eq!(source.now_nanos(), 1000);

        source.set(500);
        assert_eq!(source.now_nanos(), 500);
    }

    #[test]
    fn test_stepping_source_advances_per_sample() {
        let source = SteppingTimeSource::new(100, 10);
        assert_eq!(source.now_nanos(), 100);
        assert_eq!(source.now_nanos(), 110);
        assert_eq!(source.now_nanos(), 120);
    }
}
