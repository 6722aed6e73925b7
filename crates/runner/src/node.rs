//! Node Runner
//!
//! Runs one cluster node: an [`HlcEngine`] with its own time source, a loop
//! generating local events, and best-effort gossip to random peers. Incoming
//! gossip is folded in via `synchronize`, with every merge checked for
//! causal ordering.

use chronon_clock::HlcEngine;
use chronon_core::{NodeId, Timestamp};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A timestamp gossiped from one node to another
#[derive(Debug, Clone, Copy)]
pub struct Gossip {
    /// Node that sent the gossip
    pub from: NodeId,
    /// Sender's latest timestamp at send time
    pub timestamp: Timestamp,
}

/// What one node observed over its run
#[derive(Debug, Clone, Default)]
pub struct NodeReport {
    /// Every timestamp this node issued (local events and merges)
    pub timestamps: Vec<Timestamp>,
    /// Gossip messages folded in successfully
    pub syncs_applied: u64,
    /// Gossip rejected for exceeding the drift bound
    pub syncs_rejected: u64,
    /// Merged timestamps that failed to exceed the gossiped timestamp
    pub causality_violations: u64,
}

/// One simulated cluster node
pub struct NodeRunner {
    engine: Arc<HlcEngine>,
    inbox: mpsc::Receiver<Gossip>,
    peers: Vec<mpsc::Sender<Gossip>>,
    events: usize,
    gossip_probability: f64,
    rng: StdRng,
}

impl NodeRunner {
    pub fn new(
        engine: Arc<HlcEngine>,
        inbox: mpsc::Receiver<Gossip>,
        peers: Vec<mpsc::Sender<Gossip>>,
        events: usize,
        gossip_probability: f64,
        seed: u64,
    ) -> Self {
        Self {
            engine,
            inbox,
            peers,
            events,
            gossip_probability: gossip_probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run the node to completion and report what it observed.
    ///
    /// Generates the configured number of local events, gossiping after an
    /// event with the configured probability and draining any pending inbox
    /// gossip between events. After the local events finish, the node keeps
    /// receiving until every peer has hung up, so late gossip is never lost.
    pub async fn run(mut self) -> NodeReport {
        let node_id = self.engine.node_id();
        let mut report = NodeReport::default();
        debug!(
            "node {} starting: {} events over {} peers",
            node_id,
            self.events,
            self.peers.len()
        );

        for _ in 0..self.events {
            let ts = self.engine.generate();
            report.timestamps.push(ts);

            if !self.peers.is_empty() && self.rng.gen_bool(self.gossip_probability) {
                let peer = self.rng.gen_range(0..self.peers.len());
                // Best effort: a full or closed peer inbox just drops the gossip
                let _ = self.peers[peer].try_send(Gossip {
                    from: node_id,
                    timestamp: ts,
                });
            }

            while let Ok(gossip) = self.inbox.try_recv() {
                self.apply(gossip, &mut report);
            }

            // Let the other node tasks interleave
            tokio::task::yield_now().await;
        }

        // Local events done; hang up on peers and drain remaining gossip
        self.peers.clear();
        while let Some(gossip) = self.inbox.recv().await {
            self.apply(gossip, &mut report);
        }

        debug!(
            "node {} finished: {} timestamps, {} merges, {} rejections",
            node_id,
            report.timestamps.len(),
            report.syncs_applied,
            report.syncs_rejected
        );
        report
    }

    fn apply(&self, gossip: Gossip, report: &mut NodeReport) {
        match self.engine.synchronize(&gossip.timestamp) {
            Ok(merged) => {
                trace!(
                    "node {} merged {} from node {} into {}",
                    self.engine.node_id(),
                    gossip.timestamp,
                    gossip.from,
                    merged
                );
                report.timestamps.push(merged);
                report.syncs_applied += 1;
                if merged <= gossip.timestamp {
                    report.causality_violations += 1;
                }
            }
            Err(err) => {
                warn!(
                    "node {} dropped gossip from node {}: {}",
                    self.engine.node_id(),
                    gossip.from,
                    err
                );
                report.syncs_rejected += 1;
            }
        }
    }
}
