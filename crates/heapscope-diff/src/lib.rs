//! Heap-snapshot differencing.
//!
//! Given two immutable object-graph snapshots, [`GraphDiffer`] computes the
//! total reachable size of each, the identities present in one but not the
//! other, and a per-category aggregation of what was allocated and freed.
//! Reports carry counts and aggregates only, never per-node lists, so their
//! size stays bounded on arbitrarily large heaps.
//!
//! [`HeapDiff`] wraps the differ in the two-phase measurement-window
//! lifecycle: starting a session captures the "before" snapshot from a
//! [`SnapshotSource`](heapscope_heap::SnapshotSource), ending it captures
//! "after", diffs the pair and releases both snapshots eagerly.

mod differ;
mod report;
mod session;

pub use differ::{GraphDiffer, DEFAULT_MARKER};
pub use report::{CategoryChange, Changeset, DiffReport, HeapDelta, SnapshotSummary};
pub use session::{DiffError, HeapDiff};
