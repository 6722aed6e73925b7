//! Chronon Clock Infrastructure
//!
//! Hybrid logical clock (HLC) engine and the time sources it samples:
//!
//! - [`HlcEngine`]: per-node clock authority issuing unique, totally-ordered,
//!   causally consistent timestamps
//! - [`SystemTimeSource`]: production wall clock
//! - [`FixedTimeSource`] / [`SteppingTimeSource`]: deterministic sources for
//!   tests and simulation
//!
//! ## Usage
//!
//! ```ignore
//! use chronon_clock::HlcEngine;
//!
//! let clock = HlcEngine::new();
//! let a = clock.generate();
//! let b = clock.generate();
//! assert!(a < b);
//!
//! // Fold in a timestamp received from a peer; the result is greater than
//! // both the peer's timestamp and everything issued locally so far.
//! let merged = clock.synchronize(&remote)?;
//! ```

mod config;
mod engine;
mod sim;
mod system;

pub use config::EngineConfig;
pub use engine::HlcEngine;
pub use sim::{FixedTimeSource, SteppingTimeSource};
pub use system::SystemTimeSource;

// Re-export the port and domain types for convenience
pub use chronon_core::{Nanos, NodeId, Timestamp};
pub use chronon_ports::{ClockError, ClockResult, TimeSource};
