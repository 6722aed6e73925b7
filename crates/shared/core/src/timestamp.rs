use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::values::{Nanos, NodeId};

/// A hybrid logical clock timestamp.
///
/// Combines a physical wall-clock sample with a logical counter and the
/// identifier of the node that produced it. The three fields give a total
/// order: physical time first, then the logical counter, then the node id as
/// a deterministic tie-break, so timestamps from two distinct nodes never
/// compare equal even when physical time and counter coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Physical time in nanoseconds since the Unix epoch
    pub physical_time: Nanos,
    /// Logical counter disambiguating events sharing the same physical time
    pub logical_counter: u64,
    /// Identifier of the node that produced this timestamp
    pub node_id: NodeId,
}

impl Timestamp {
    /// Create a timestamp from raw parts.
    ///
    /// No validation is performed; any bit pattern is a legal timestamp.
    pub fn new(physical_time: Nanos, logical_counter: u64, node_id: NodeId) -> Self {
        Self {
            physical_time,
            logical_counter,
            node_id,
        }
    }

    /// Returns true if this timestamp is causally before `other`
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self < other
    }

    /// Encode as a JSON object with the three named fields.
    ///
    /// `u64` values are emitted as JSON integers and round-trip exactly,
    /// including `u64::MAX`; the node id round-trips as its hyphenated
    /// string form.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("timestamp has no unserializable fields")
    }

    /// Decode a timestamp previously produced by [`encode`](Self::encode).
    ///
    /// Rejects malformed input: missing fields, wrong types, negative or
    /// out-of-range numbers, invalid node ids. A field is never silently
    /// truncated.
    pub fn decode(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.physical_time
            .cmp(&other.physical_time)
            .then(self.logical_counter.cmp(&other.logical_counter))
            .then(self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.physical_time, self.logical_counter, self.node_id
        )
    }
}
