use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-category aggregate of one diff.
///
/// `size_bytes` is the net byte delta contributed by this category
/// (negative when more was freed than allocated); `allocated`/`freed`
/// count the node identities that appeared/disappeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub size_bytes: i64,
    /// Humanized rendering of `size_bytes`.
    pub size: String,
    pub allocated: u64,
    pub freed: u64,
}

/// Mapping from category label to its aggregate change.
///
/// Labels are category names (`"Array"`, `"String"`, …) except for plain
/// objects, which aggregate under their display name. Iteration order is
/// unspecified; consumers must treat this as an unordered mapping.
pub type Changeset = BTreeMap<String, CategoryChange>;

/// Summary of one snapshot as seen by a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Total node count of the snapshot, reachable or not.
    pub nodes: u64,
    /// Capture time, unix seconds.
    pub time: u64,
    /// Total self-size of all reachable non-hidden nodes.
    pub size_bytes: u64,
    /// Humanized rendering of `size_bytes`.
    pub size: String,
}

/// Net change between the two snapshots of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapDelta {
    /// After-total minus before-total, in bytes.
    pub size_bytes: i64,
    /// Humanized rendering of `size_bytes`.
    pub size: String,
    /// Node identities reachable in "before" but not in "after".
    pub freed_nodes: u64,
    /// Node identities reachable in "after" but not in "before".
    pub allocated_nodes: u64,
    pub details: Changeset,
}

/// The output of one differencing operation. Immutable once produced;
/// owned by the caller and directly serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub before: SnapshotSummary,
    pub after: SnapshotSummary,
    pub change: HeapDelta,
}
