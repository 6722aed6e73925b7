//! Simulation - cluster orchestration
//!
//! Wires up a cluster of independent clock engines:
//! - One engine and time source per node, each with its own rate and offset
//! - mpsc gossip channels between every pair of nodes
//! - Causality and uniqueness verification over everything the cluster issued

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chronon_clock::{EngineConfig, HlcEngine, SteppingTimeSource};
use chronon_core::{NodeId, Timestamp};
use log::info;
use tokio::sync::mpsc;

use crate::node::{Gossip, NodeRunner};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of cluster nodes
    pub nodes: usize,
    /// Local events each node generates
    pub events_per_node: usize,
    /// Probability of gossiping to a random peer after each event
    pub gossip_probability: f64,
    /// Base seed for the per-node RNGs (each node derives its own)
    pub seed: u64,
    /// Drift bound handed to every engine, in seconds
    pub max_drift_seconds: f64,
    /// First node's clock start, nanoseconds since epoch
    pub base_time_nanos: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nodes: 3,
            events_per_node: 200,
            gossip_probability: 0.3,
            seed: 42,
            max_drift_seconds: 60.0,
            base_time_nanos: 1_000_000_000_000_000_000,
        }
    }
}

/// Simulation results
#[derive(Debug, Clone, Default)]
pub struct SimulationResults {
    /// Timestamps issued per node (local events plus merges)
    pub timestamps_by_node: HashMap<NodeId, u64>,
    /// Total timestamps issued cluster-wide
    pub total_timestamps: u64,
    /// Gossip messages folded in successfully
    pub total_syncs: u64,
    /// Gossip rejected for exceeding the drift bound
    pub total_rejections: u64,
    /// Merges that failed to exceed the gossiped timestamp
    pub causality_violations: u64,
    /// Timestamp pairs that compared equal across the cluster
    pub uniqueness_violations: u64,
    /// Whether the run completed with no violations
    pub success: bool,
    /// Error message if any
    pub error: Option<String>,
}

/// Full cluster simulation
pub struct ClusterSimulation {
    config: SimulationConfig,
}

impl ClusterSimulation {
    /// Create a simulation with default configuration
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Create a simulation with custom configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run the cluster to completion and verify its output.
    ///
    /// Each node runs as a tokio task. After all tasks finish, every
    /// timestamp issued anywhere in the cluster is checked for pairwise
    /// distinctness; per-node causality checks are accumulated by the
    /// node runners themselves.
    pub async fn run(self) -> SimulationResults {
        let config = self.config;
        let mut results = SimulationResults::default();

        if config.nodes == 0 {
            results.error = Some("cluster needs at least one node".to_string());
            return results;
        }

        // Build engines: every node gets its own rate and offset so clocks
        // skew relative to each other while staying inside the drift bound.
        let mut engines = Vec::with_capacity(config.nodes);
        for i in 0..config.nodes {
            let source = Arc::new(SteppingTimeSource::new(
                config.base_time_nanos + i as u64 * 1_000,
                100 + i as u64 * 37,
            ));
            let engine_config = EngineConfig {
                node_id: None,
                max_drift_seconds: config.max_drift_seconds,
            };
            match HlcEngine::with_config(engine_config, source) {
                Ok(engine) => engines.push(Arc::new(engine)),
                Err(err) => {
                    results.error = Some(err.to_string());
                    return results;
                }
            }
        }

        // Wire gossip channels: one inbox per node, one sender per peer.
        // Capacity covers everything a node could ever be sent.
        let capacity = (config.nodes * config.events_per_node).max(1);
        let mut senders = Vec::with_capacity(config.nodes);
        let mut inboxes = Vec::with_capacity(config.nodes);
        for _ in 0..config.nodes {
            let (tx, rx) = mpsc::channel::<Gossip>(capacity);
            senders.push(tx);
            inboxes.push(rx);
        }

        info!(
            "starting cluster: {} nodes, {} events each, gossip p={}",
            config.nodes, config.events_per_node, config.gossip_probability
        );

        let mut handles = Vec::with_capacity(config.nodes);
        for (i, (engine, inbox)) in engines.iter().zip(inboxes).enumerate() {
            let peers: Vec<_> = senders
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, tx)| tx.clone())
                .collect();
            let runner = NodeRunner::new(
                engine.clone(),
                inbox,
                peers,
                config.events_per_node,
                config.gossip_probability,
                config.seed.wrapping_add(i as u64),
            );
            handles.push(tokio::spawn(runner.run()));
        }
        // Runners hold the only senders now; nodes can observe hang-up
        drop(senders);

        let mut all_timestamps: Vec<Timestamp> = Vec::new();
        for (engine, handle) in engines.iter().zip(handles) {
            match handle.await {
                Ok(report) => {
                    results
                        .timestamps_by_node
                        .insert(engine.node_id(), report.timestamps.len() as u64);
                    results.total_syncs += report.syncs_applied;
                    results.total_rejections += report.syncs_rejected;
                    results.causality_violations += report.causality_violations;
                    all_timestamps.extend(report.timestamps);
                }
                Err(err) => {
                    results.error = Some(format!("node task failed: {err}"));
                    return results;
                }
            }
        }

        results.total_timestamps = all_timestamps.len() as u64;
        let unique: HashSet<_> = all_timestamps.iter().copied().collect();
        results.uniqueness_violations = (all_timestamps.len() - unique.len()) as u64;

        results.success =
            results.causality_violations == 0 && results.uniqueness_violations == 0;
        info!(
            "cluster finished: {} timestamps, {} syncs, {} rejections, success={}",
            results.total_timestamps, results.total_syncs, results.total_rejections,
            results.success
        );
        results
    }
}

impl Default for ClusterSimulation {
    fn default() -> Self {
        Self::new()
    }
}
