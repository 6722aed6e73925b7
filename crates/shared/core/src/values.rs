use uuid::Uuid;

/// Node identifier - 128-bit value unique to one clock instance.
/// Acts as the final tie-break in the timestamp total order.
pub type NodeId = Uuid;

/// Physical time as nanoseconds since the Unix epoch
pub type Nanos = u64;
