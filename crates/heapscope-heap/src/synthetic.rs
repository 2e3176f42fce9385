use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::category::NodeCategory;
use crate::snapshot::{HeapSnapshot, NodeInfo, SnapshotSource};

/// Construction errors for [`SyntheticSnapshotBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("graph has no root node")]
    MissingRoot,

    #[error("node {id} is referenced but not defined")]
    UnknownNode { id: u64 },

    #[error("node {id} is defined twice")]
    DuplicateNode { id: u64 },
}

#[derive(Debug, Clone)]
struct SyntheticNode {
    category: NodeCategory,
    name: String,
    self_size: u64,
    children: Vec<u64>,
}

/// Deterministic in-memory [`HeapSnapshot`].
///
/// Built once via [`SyntheticSnapshotBuilder`] and immutable afterwards.
/// This is the snapshot implementation used by the test suites and the
/// fuzz harness; embedders without a live runtime can use it as a fixture.
#[derive(Debug, Clone)]
pub struct SyntheticSnapshot {
    root: u64,
    nodes: BTreeMap<u64, SyntheticNode>,
}

impl SyntheticSnapshot {
    pub fn builder() -> SyntheticSnapshotBuilder {
        SyntheticSnapshotBuilder::default()
    }
}

impl HeapSnapshot for SyntheticSnapshot {
    fn root_id(&self) -> u64 {
        self.root
    }

    fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    fn node_by_id(&self, id: u64) -> Option<NodeInfo<'_>> {
        self.nodes.get(&id).map(|node| NodeInfo {
            id,
            category: node.category,
            name: &node.name,
            self_size: node.self_size,
        })
    }

    fn children_of(&self, id: u64) -> &[u64] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }
}

/// Builder for [`SyntheticSnapshot`].
///
/// Nodes are declared with explicit identities so the same identity can be
/// reused across a "before"/"after" snapshot pair. Edges and the root are
/// validated at [`build`](Self::build) time; dangling references are a
/// construction error rather than a silently empty child list.
#[derive(Debug, Default)]
pub struct SyntheticSnapshotBuilder {
    root: Option<u64>,
    nodes: BTreeMap<u64, SyntheticNode>,
    edges: Vec<(u64, u64)>,
    duplicate: Option<u64>,
}

impl SyntheticSnapshotBuilder {
    /// Declare the root node identity.
    pub fn root(mut self, id: u64) -> Self {
        self.root = Some(id);
        self
    }

    /// Declare a node with an empty display name.
    pub fn node(self, id: u64, category: NodeCategory, self_size: u64) -> Self {
        self.insert(id, category, String::new(), self_size)
    }

    /// Declare an [`NodeCategory::Object`] node with a display name.
    pub fn object(self, id: u64, name: impl Into<String>, self_size: u64) -> Self {
        self.insert(id, NodeCategory::Object, name.into(), self_size)
    }

    /// Declare a directed edge between two declared nodes.
    pub fn edge(mut self, from: u64, to: u64) -> Self {
        self.edges.push((from, to));
        self
    }

    fn insert(mut self, id: u64, category: NodeCategory, name: String, self_size: u64) -> Self {
        let replaced = self.nodes.insert(
            id,
            SyntheticNode {
                category,
                name,
                self_size,
                children: Vec::new(),
            },
        );
        if replaced.is_some() && self.duplicate.is_none() {
            self.duplicate = Some(id);
        }
        self
    }

    pub fn build(mut self) -> Result<SyntheticSnapshot, GraphError> {
        if let Some(id) = self.duplicate {
            return Err(GraphError::DuplicateNode { id });
        }

        let root = self.root.ok_or(GraphError::MissingRoot)?;
        if !self.nodes.contains_key(&root) {
            return Err(GraphError::UnknownNode { id: root });
        }

        for &(from, to) in &self.edges {
            if !self.nodes.contains_key(&to) {
                return Err(GraphError::UnknownNode { id: to });
            }
            let node = self
                .nodes
                .get_mut(&from)
                .ok_or(GraphError::UnknownNode { id: from })?;
            node.children.push(to);
        }

        Ok(SyntheticSnapshot {
            root,
            nodes: self.nodes,
        })
    }
}

/// Capture error for [`ScriptedSnapshotSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no scripted snapshot remaining")]
pub struct SourceExhausted;

/// [`SnapshotSource`] that hands out pre-built snapshots in order.
///
/// The deterministic stand-in for a live-runtime capturer: tests script the
/// "before" and "after" graphs up front and can assert that every captured
/// snapshot was released exactly once.
#[derive(Debug, Default)]
pub struct ScriptedSnapshotSource {
    pending: VecDeque<SyntheticSnapshot>,
    released: Arc<AtomicUsize>,
}

/// Handle observing how many snapshots a [`ScriptedSnapshotSource`] has
/// released, usable after the source itself was moved into a session.
#[derive(Debug, Clone)]
pub struct ReleaseProbe {
    released: Arc<AtomicUsize>,
}

impl ReleaseProbe {
    pub fn count(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }
}

impl ScriptedSnapshotSource {
    pub fn new(snapshots: impl IntoIterator<Item = SyntheticSnapshot>) -> Self {
        Self {
            pending: snapshots.into_iter().collect(),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of snapshots released back to this source so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    pub fn release_probe(&self) -> ReleaseProbe {
        ReleaseProbe {
            released: self.released.clone(),
        }
    }
}

impl SnapshotSource for ScriptedSnapshotSource {
    type Snapshot = SyntheticSnapshot;
    type Error = SourceExhausted;

    fn capture(&mut self) -> Result<SyntheticSnapshot, SourceExhausted> {
        self.pending.pop_front().ok_or(SourceExhausted)
    }

    fn release(&mut self, snapshot: SyntheticSnapshot) {
        self.released.fetch_add(1, Ordering::Relaxed);
        drop(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_cyclic_graph() {
        let snapshot = SyntheticSnapshot::builder()
            .root(0)
            .node(0, NodeCategory::Hidden, 0)
            .node(1, NodeCategory::Array, 16)
            .node(2, NodeCategory::Array, 16)
            .edge(0, 1)
            .edge(1, 2)
            .edge(2, 1)
            .build()
            .expect("valid graph");

        assert_eq!(snapshot.root_id(), 0);
        assert_eq!(snapshot.node_count(), 3);
        assert_eq!(snapshot.children_of(1), &[2]);
        assert_eq!(snapshot.children_of(2), &[1]);
        assert_eq!(snapshot.children_of(42), &[] as &[u64]);

        let node = snapshot.node_by_id(1).expect("node 1");
        assert_eq!(node.category, NodeCategory::Array);
        assert_eq!(node.self_size, 16);
    }

    #[test]
    fn object_nodes_carry_their_name() {
        let snapshot = SyntheticSnapshot::builder()
            .root(1)
            .object(1, "Session", 96)
            .build()
            .expect("valid graph");

        let node = snapshot.node_by_id(1).expect("node 1");
        assert_eq!(node.category, NodeCategory::Object);
        assert_eq!(node.name, "Session");
    }

    #[test]
    fn dangling_edges_are_rejected() {
        let err = SyntheticSnapshot::builder()
            .root(1)
            .node(1, NodeCategory::Array, 8)
            .edge(1, 2)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownNode { id: 2 });
    }

    #[test]
    fn missing_and_duplicate_declarations_are_rejected() {
        let err = SyntheticSnapshot::builder()
            .node(1, NodeCategory::Array, 8)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::MissingRoot);

        let err = SyntheticSnapshot::builder()
            .root(7)
            .node(1, NodeCategory::Array, 8)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownNode { id: 7 });

        let err = SyntheticSnapshot::builder()
            .root(1)
            .node(1, NodeCategory::Array, 8)
            .node(1, NodeCategory::String, 8)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode { id: 1 });
    }

    #[test]
    fn scripted_source_hands_out_snapshots_in_order() {
        let first = SyntheticSnapshot::builder()
            .root(1)
            .node(1, NodeCategory::Array, 8)
            .build()
            .unwrap();
        let second = SyntheticSnapshot::builder()
            .root(2)
            .node(2, NodeCategory::String, 8)
            .build()
            .unwrap();

        let mut source = ScriptedSnapshotSource::new([first, second]);
        let a = source.capture().expect("first capture");
        assert_eq!(a.root_id(), 1);
        let b = source.capture().expect("second capture");
        assert_eq!(b.root_id(), 2);
        assert_eq!(source.capture().unwrap_err(), SourceExhausted);

        source.release(a);
        source.release(b);
        assert_eq!(source.released(), 2);
    }
}
