//! Chronon Ports
//!
//! Port definitions (traits) for the Chronon hybrid logical clock.
//! These define the boundaries between domain logic and infrastructure.

mod error;
mod time_source;

pub use error::{ClockError, ClockResult};
pub use time_source::TimeSource;
