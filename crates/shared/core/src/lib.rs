//! Chronon Core Domain
//!
//! Pure domain types for the Chronon hybrid logical clock.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod timestamp;
pub mod values;

// Re-export commonly used types at crate root
pub use timestamp::Timestamp;
pub use values::{Nanos, NodeId};
