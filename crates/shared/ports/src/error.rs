use thiserror::Error;

/// Domain-level errors for clock operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    /// External timestamp's physical time exceeds the local sample by more
    /// than the drift bound
    #[error("external timestamp is {0:.3}s ahead of local time, beyond the drift bound")]
    TooFarInFuture(f64),

    /// Local sample exceeds the external timestamp's physical time by more
    /// than the drift bound
    #[error("external timestamp is {0:.3}s behind local time, beyond the drift bound")]
    TooFarInPast(f64),

    /// Raised at construction only, for an invalid drift bound
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;
