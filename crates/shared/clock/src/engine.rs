//! Hybrid logical clock engine
//!
//! One [`HlcEngine`] is the clock authority for one node identifier. It
//! issues timestamps for local events (`generate`) and folds in timestamps
//! observed from peers (`synchronize`), keeping the sequence it returns
//! strictly increasing under the timestamp total order regardless of how
//! concurrent callers interleave.

use std::sync::{Arc, Mutex, PoisonError};

use chronon_core::{NodeId, Timestamp};
use chronon_ports::{ClockError, ClockResult, TimeSource};
use log::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::system::SystemTimeSource;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// The last timestamp emitted or accepted by one engine.
///
/// A single mutex guards the cell: `generate`, `synchronize`, and snapshot
/// reads all serialize through it, each write being one read-modify-write.
/// Critical sections are O(1) - time sampling and drift validation happen
/// before the lock is taken.
struct ClockState {
    last: Mutex<Timestamp>,
}

impl ClockState {
    fn new(seed: Timestamp) -> Self {
        Self {
            last: Mutex::new(seed),
        }
    }

    /// Compute the successor of the current timestamp with `f` and commit it.
    ///
    /// A poisoned lock is recovered by taking the inner value: the guarded
    /// state is a plain `Timestamp`, which a panicking writer cannot leave
    /// half-updated.
    fn advance(&self, f: impl FnOnce(&Timestamp) -> Timestamp) -> Timestamp {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let next = f(&last);
        *last = next;
        next
    }

    fn snapshot(&self) -> Timestamp {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hybrid logical clock engine for one node.
///
/// Combines physical time samples with a logical counter so that timestamps
/// stay unique and monotonic even when the physical clock stalls or steps
/// backwards. Multiple engines may coexist in one process (e.g. simulating
/// several nodes); each is fully independent.
///
/// The logical counter saturates at `u64::MAX` instead of wrapping: wrapping
/// would silently reorder timestamps, and at one event per nanosecond the
/// counter takes centuries of same-tick events to exhaust.
///
/// The engine is `Send + Sync`; share it across threads or tasks with
/// [`Arc`] and call [`generate`](Self::generate) and
/// [`synchronize`](Self::synchronize) concurrently without external locking.
pub struct HlcEngine {
    node_id: NodeId,
    max_drift_seconds: f64,
    time_source: Arc<dyn TimeSource>,
    state: ClockState,
}

impl HlcEngine {
    /// Create an engine with a fresh random node id, the system wall clock,
    /// and the default 60 second drift bound.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default(), Arc::new(SystemTimeSource::new()))
            .expect("default engine configuration is valid")
    }

    /// Create an engine from explicit configuration and time source.
    ///
    /// Fails with [`ClockError::InvalidConfiguration`] for a negative or
    /// non-finite drift bound.
    pub fn with_config(
        config: EngineConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> ClockResult<Self> {
        config.validate()?;
        let node_id = config.node_id.unwrap_or_else(Uuid::new_v4);

        // Seed one nanosecond behind the current sample so the first
        // generated timestamp is comparable to the seed from the start.
        let seed = Timestamp::new(time_source.now_nanos().saturating_sub(1), 0, node_id);
        debug!(
            "clock engine for node {} seeded at {} from {}",
            node_id,
            seed.physical_time,
            time_source.name()
        );

        Ok(Self {
            node_id,
            max_drift_seconds: config.max_drift_seconds,
            time_source,
            state: ClockState::new(seed),
        })
    }

    /// Produce a timestamp for a local event.
    ///
    /// If physical time has advanced past the last timestamp the counter
    /// resets to zero; otherwise the counter increments at the last physical
    /// time. The result is strictly greater than every timestamp previously
    /// returned by this engine. Infallible.
    pub fn generate(&self) -> Timestamp {
        let now = self.time_source.now_nanos();
        self.state.advance(|last| {
            if now > last.physical_time {
                Timestamp::new(now, 0, self.node_id)
            } else {
                Timestamp::new(
                    last.physical_time,
                    last.logical_counter.saturating_add(1),
                    self.node_id,
                )
            }
        })
    }

    /// Fold a peer-observed timestamp into local state.
    ///
    /// Rejects the external timestamp when its physical time differs from
    /// the local sample by more than the drift bound, leaving state
    /// untouched. On success the returned timestamp is strictly greater
    /// than both `external` and every prior local timestamp, and is stamped
    /// with the local node id.
    pub fn synchronize(&self, external: &Timestamp) -> ClockResult<Timestamp> {
        // One sample serves both validation and the commit below; sampling
        // again under the lock could commit a time that was never validated.
        let now = self.time_source.now_nanos();

        let delta_nanos = (now as i128 - external.physical_time as i128).unsigned_abs();
        let delta_seconds = delta_nanos as f64 / NANOS_PER_SECOND;
        if delta_seconds > self.max_drift_seconds {
            let err = if now < external.physical_time {
                ClockError::TooFarInFuture(delta_seconds)
            } else {
                ClockError::TooFarInPast(delta_seconds)
            };
            warn!(
                "node {}: rejecting timestamp from node {}: {}",
                self.node_id, external.node_id, err
            );
            return Err(err);
        }

        Ok(self.state.advance(|last| {
            let max_time = now.max(last.physical_time).max(external.physical_time);
            let logical = if max_time == last.physical_time
                && max_time == external.physical_time
            {
                last.logical_counter
                    .max(external.logical_counter)
                    .saturating_add(1)
            } else if max_time == last.physical_time {
                last.logical_counter.saturating_add(1)
            } else if max_time == external.physical_time {
                external.logical_counter.saturating_add(1)
            } else {
                // The fresh physical sample alone is the max
                0
            };
            Timestamp::new(max_time, logical, self.node_id)
        }))
    }

    /// Snapshot of the last timestamp emitted or accepted. No mutation.
    pub fn last_timestamp(&self) -> Timestamp {
        self.state.snapshot()
    }

    /// This engine's node identifier
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The configured drift bound in seconds
    pub fn max_drift_seconds(&self) -> f64 {
        self.max_drift_seconds
    }

    /// Name of the underlying time source, for diagnostics
    pub fn time_source_name(&self) -> &str {
        self.time_source.name()
    }
}

impl Default for HlcEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use crate::sim::{FixedTimeSource, SteppingTimeSource};

    use super::*;

    fn node(n: u128) -> NodeId {
        Uuid::from_u128(n)
    }

    fn engine_at(now: u64, node_id: NodeId) -> (HlcEngine, Arc<FixedTimeSource>) {
        let source = Arc::new(FixedTimeSource::new(now));
        let config = EngineConfig {
            node_id: Some(node_id),
            ..Default::default()
        };
        let engine = HlcEngine::with_config(config, source.clone()).unwrap();
        (engine, source)
    }

    #[test]
    fn test_generate_is_strictly_monotonic() {
        let source = Arc::new(SteppingTimeSource::new(1_000_000, 7));
        let engine = HlcEngine::with_config(EngineConfig::default(), source).unwrap();

        let mut last = engine.generate();
        for _ in 0..1000 {
            let next = engine.generate();
            assert!(next > last, "{next} must exceed {last}");
            last = next;
        }
    }

    #[test]
    fn test_logical_counter_increments_at_fixed_time() {
        let (engine, _) = engine_at(1000, node(1));

        let a = engine.generate();
        let b = engine.generate();
        let c = engine.generate();

        assert_eq!((a.physical_time, a.logical_counter), (1000, 0));
        assert_eq!((b.physical_time, b.logical_counter), (1000, 1));
        assert_eq!((c.physical_time, c.logical_counter), (1000, 2));
    }

    #[test]
    fn test_counter_resets_when_time_advances() {
        let (engine, source) = engine_at(1000, node(1));
        engine.generate();
        engine.generate();

        source.set(2000);
        let ts = engine.generate();
        assert_eq!((ts.physical_time, ts.logical_counter), (2000, 0));
    }

    #[test]
    fn test_generate_tolerates_backwards_clock() {
        let (engine, source) = engine_at(5000, node(1));
        let before = engine.generate();

        source.set(100);
        let after = engine.generate();

        assert!(after > before);
        assert_eq!(after.physical_time, 5000);
        assert_eq!(after.logical_counter, 1);
    }

    #[test]
    fn test_synchronize_with_future_timestamp() {
        let (engine, _) = engine_at(1000, node(1));
        engine.generate();

        let external = Timestamp::new(2000, 5, node(2));
        let merged = engine.synchronize(&external).unwrap();

        assert_eq!(merged, Timestamp::new(2000, 6, node(1)));
        assert!(merged > external);
        assert_eq!(engine.last_timestamp(), merged);
    }

    #[test]
    fn test_synchronize_with_past_timestamp() {
        let (engine, _) = engine_at(2000, node(1));
        let local = engine.generate();
        assert_eq!(local, Timestamp::new(2000, 0, node(1)));

        let external = Timestamp::new(1000, 5, node(2));
        let merged = engine.synchronize(&external).unwrap();

        assert_eq!(merged, Timestamp::new(2000, 1, node(1)));
        assert!(merged > local);
        assert!(merged > external);
    }

    #[test]
    fn test_synchronize_with_tied_physical_time() {
        let (engine, _) = engine_at(1000, node(1));
        engine.generate();
        engine.generate();
        let local = engine.generate();
        assert_eq!(local.logical_counter, 2);

        let external = Timestamp::new(1000, 10, node(2));
        let merged = engine.synchronize(&external).unwrap();

        assert_eq!(merged, Timestamp::new(1000, 11, node(1)));
    }

    #[test]
    fn test_synchronize_when_local_sample_is_ahead() {
        let (engine, source) = engine_at(1000, node(1));
        engine.generate();

        source.set(5000);
        let external = Timestamp::new(1200, 3, node(2));
        let merged = engine.synchronize(&external).unwrap();

        assert_eq!(merged, Timestamp::new(5000, 0, node(1)));
    }

    #[test]
    fn test_synchronize_rejects_future_beyond_drift_bound() {
        let source = Arc::new(FixedTimeSource::new(1000));
        let config = EngineConfig {
            node_id: Some(node(1)),
            max_drift_seconds: 1.0,
        };
        let engine = HlcEngine::with_config(config, source).unwrap();
        let before = engine.last_timestamp();

        let external = Timestamp::new(1000 + 2_000_000_000, 0, node(2));
        match engine.synchronize(&external) {
            Err(ClockError::TooFarInFuture(delta)) => {
                assert!((delta - 2.0).abs() < 1e-9);
            }
            other => panic!("expected TooFarInFuture, got {other:?}"),
        }

        // Rejection leaves state untouched
        assert_eq!(engine.last_timestamp(), before);
    }

    #[test]
    fn test_synchronize_rejects_past_beyond_drift_bound() {
        let source = Arc::new(FixedTimeSource::new(3_000_000_000));
        let config = EngineConfig {
            node_id: Some(node(1)),
            max_drift_seconds: 1.0,
        };
        let engine = HlcEngine::with_config(config, source).unwrap();
        let before = engine.last_timestamp();

        let external = Timestamp::new(500_000_000, 9, node(2));
        match engine.synchronize(&external) {
            Err(ClockError::TooFarInPast(delta)) => {
                assert!((delta - 2.5).abs() < 1e-9);
            }
            other => panic!("expected TooFarInPast, got {other:?}"),
        }
        assert_eq!(engine.last_timestamp(), before);
    }

    #[test]
    fn test_synchronize_result_carries_local_node_id() {
        let (engine, _) = engine_at(1000, node(1));
        let merged = engine.synchronize(&Timestamp::new(1500, 0, node(2))).unwrap();
        assert_eq!(merged.node_id, node(1));
    }

    #[test]
    fn test_invalid_drift_bound_fails_construction() {
        let source = Arc::new(FixedTimeSource::new(1000));
        let config = EngineConfig {
            node_id: Some(node(1)),
            max_drift_seconds: -0.5,
        };
        assert!(matches!(
            HlcEngine::with_config(config, source),
            Err(ClockError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_engines_with_distinct_node_ids_never_collide() {
        let (a, _) = engine_at(1000, node(1));
        let (b, _) = engine_at(1000, node(2));

        let ta = a.generate();
        let tb = b.generate();

        assert_ne!(ta, tb);
        assert_eq!(ta.physical_time, tb.physical_time);
        assert_eq!(ta.logical_counter, tb.logical_counter);
        assert!(ta < tb); // ordered solely by node id
    }

    #[test]
    fn test_last_timestamp_does_not_advance() {
        let (engine, _) = engine_at(1000, node(1));
        engine.generate();

        let s1 = engine.last_timestamp();
        let s2 = engine.last_timestamp();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_accessors() {
        let source = Arc::new(FixedTimeSource::new(1000));
        let config = EngineConfig {
            node_id: Some(node(9)),
            max_drift_seconds: 2.5,
        };
        let engine = HlcEngine::with_config(config, source).unwrap();

        assert_eq!(engine.node_id(), node(9));
        assert_eq!(engine.max_drift_seconds(), 2.5);
        assert_eq!(engine.time_source_name(), "FixedTimeSource");
    }

    #[test]
    fn test_concurrent_generate_yields_distinct_ordered_timestamps() {
        let source = Arc::new(SteppingTimeSource::new(1_000_000_000, 3));
        let engine = Arc::new(
            HlcEngine::with_config(
                EngineConfig {
                    node_id: Some(node(1)),
                    ..Default::default()
                },
                source,
            )
            .unwrap(),
        );

        let threads = 8;
        let per_thread = 500;
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || {
                    (0..per_thread).map(|_| engine.generate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let mut batch = handle.join().unwrap();
            // Each thread must observe its own sequence in increasing order
            assert!(batch.windows(2).all(|w| w[0] < w[1]));
            all.append(&mut batch);
        }

        assert_eq!(all.len(), threads * per_thread);
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len(), "timestamps must be pairwise distinct");

        all.sort();
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_concurrent_generate_and_synchronize_stay_monotonic() {
        let source = Arc::new(SteppingTimeSource::new(1_000_000_000, 5));
        let engine = Arc::new(
            HlcEngine::with_config(
                EngineConfig {
                    node_id: Some(node(1)),
                    ..Default::default()
                },
                source,
            )
            .unwrap(),
        );

        let generators: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || (0..200).map(|_| engine.generate()).collect::<Vec<_>>())
            })
            .collect();
        let synchronizers: Vec<_> = (0..4)
            .map(|i| {
                let engine = engine.clone();
                thread::spawn(move || {
                    (0..200u64)
                        .map(|j| {
                            let external =
                                Timestamp::new(1_000_000_000 + j, j, node(100 + i));
                            engine.synchronize(&external).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in generators.into_iter().chain(synchronizers) {
            all.extend(handle.join().unwrap());
        }

        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }
}
