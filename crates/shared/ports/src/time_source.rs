use chronon_core::Nanos;

/// Port for physical time abstraction
///
/// This allows the clock engine to use different time sources:
/// - Real system time for production
/// - Fixed or manually stepped time for deterministic tests
pub trait TimeSource: Send + Sync {
    /// Current physical time in nanoseconds since the Unix epoch.
    ///
    /// Treated as authoritative: the engine never second-guesses a sample.
    /// Successive samples need not be strictly increasing, and no ordering
    /// is assumed between samples taken on different threads; the engine
    /// tolerates stalled or regressing physical clocks.
    fn now_nanos(&self) -> Nanos;

    /// Get the time source's name/identifier for debugging
    fn name(&self) -> &str {
        "TimeSource"
    }
}
