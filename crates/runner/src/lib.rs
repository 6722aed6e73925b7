//! Chronon Runner - Multi-Node Clock Simulation
//!
//! Orchestrates a cluster of independent hybrid logical clock engines, each
//! running as its own tokio task with its own skewed time source, gossiping
//! timestamps to random peers:
//!
//! - **Node Runner**: one engine plus its gossip loop
//! - **Simulation**: cluster wiring, execution, and causality verification
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────┐  gossip   ┌────────────┐
//!   │  Node 0    │──────────▶│  Node 1    │
//!   │  HlcEngine │◀──────────│  HlcEngine │
//!   └─────┬──────┘           └──────┬─────┘
//!         │        gossip           │
//!         └───────▶┌────────────┐◀──┘
//!                  │  Node 2    │
//!                  │  HlcEngine │
//!                  └────────────┘
//! ```
//!
//! Every received timestamp is folded in via `synchronize`; the simulation
//! checks that each merged timestamp exceeds the gossiped one (causality)
//! and that all timestamps issued cluster-wide are pairwise distinct.

pub mod node;
pub mod simulation;

// Re-export main types
pub use node::{Gossip, NodeReport, NodeRunner};
pub use simulation::{ClusterSimulation, SimulationConfig, SimulationResults};
