use chronon_core::Nanos;
use chronon_ports::TimeSource;
use chrono::Utc;

/// Real system clock for production use
///
/// Returns wall-clock nanoseconds since the Unix epoch.
/// Use this in production where you want real-time behavior.
pub struct SystemTimeSource;

impl SystemTimeSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_nanos(&self) -> Nanos {
        // i64 nanoseconds overflow in 2262; saturate rather than panic.
        // Pre-epoch dates clamp to zero.
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX).max(0) as Nanos
    }

    fn name(&self) -> &str {
        "SystemTimeSource"
    }
}
