use crate::category::NodeCategory;

/// Borrowed per-node facts exposed by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo<'a> {
    /// Stable 64-bit identity, unique within the snapshot and comparable
    /// across snapshots of the same process lifetime.
    pub id: u64,
    pub category: NodeCategory,
    /// Display name; meaningful only when `category` is
    /// [`NodeCategory::Object`], empty otherwise.
    pub name: &'a str,
    /// Self-size in bytes (excluding retained children).
    pub self_size: u64,
}

/// Read-only view of an immutable object graph captured at an instant.
///
/// Implementations must be stable for the lifetime of the value: repeated
/// calls observe the same graph. Diamond-shaped references and cycles are
/// legal and must be representable.
pub trait HeapSnapshot {
    /// Identity of the root node the reachable graph hangs off.
    fn root_id(&self) -> u64;

    /// Total number of nodes in the snapshot, reachable or not.
    fn node_count(&self) -> u64;

    /// Look up a node by its stable identity.
    fn node_by_id(&self, id: u64) -> Option<NodeInfo<'_>>;

    /// Outgoing edges of `id`, in snapshot order; empty for unknown ids.
    fn children_of(&self, id: u64) -> &[u64];
}

/// Producer and owner of [`HeapSnapshot`] values.
///
/// Whoever captures a snapshot owns releasing its resources; `release`
/// must be called exactly once per captured snapshot. The in-memory
/// [`SyntheticSnapshot`](crate::SyntheticSnapshot) releases on drop; a
/// live-runtime adapter typically forwards to the runtime's deterministic
/// free operation.
pub trait SnapshotSource {
    type Snapshot: HeapSnapshot;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Capture an immutable snapshot of the current object graph.
    fn capture(&mut self) -> Result<Self::Snapshot, Self::Error>;

    /// Deterministically release a captured snapshot's resources.
    fn release(&mut self, snapshot: Self::Snapshot);
}
