//! Object-graph model for heapscope.
//!
//! # Ownership / layering
//!
//! `heapscope-heap` owns the *shape* of a heap snapshot (the closed node
//! category set and the narrow read-only access traits) but never how
//! snapshots are obtained. Host integration (capturing from a live runtime,
//! binding snapshot lifetime to a collector) lives behind the
//! [`SnapshotSource`] trait and belongs to the embedding adaptation layer.
//!
//! Higher layers (the differ) depend only on [`HeapSnapshot`] and the
//! per-node facts in [`NodeInfo`], so they can be driven equally by a live
//! runtime adapter or by the deterministic in-memory
//! [`SyntheticSnapshot`] used throughout the tests.

mod category;
mod snapshot;
mod synthetic;

pub use category::NodeCategory;
pub use snapshot::{HeapSnapshot, NodeInfo, SnapshotSource};
pub use synthetic::{
    GraphError, ReleaseProbe, ScriptedSnapshotSource, SourceExhausted, SyntheticSnapshot,
    SyntheticSnapshotBuilder,
};
