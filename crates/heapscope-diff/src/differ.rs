use std::collections::{BTreeMap, HashSet};
use std::time::SystemTime;

use heapscope_core::{nice_size, unix_seconds, ActivityFlag};
use heapscope_heap::{HeapSnapshot, NodeCategory, NodeInfo};

use crate::report::{CategoryChange, Changeset, DiffReport, HeapDelta, SnapshotSummary};

/// Display name of the differ's own marker object.
///
/// A reachable `Object` node carrying this name is the measurement tool
/// itself; it is skipped during traversal so the tool does not pollute its
/// own measurement.
pub const DEFAULT_MARKER: &str = "HeapDiff";

/// Computes [`DiffReport`]s from pairs of snapshots.
///
/// The differ owns no shared mutable state beyond its [`ActivityFlag`] and
/// is safe to reuse across independent snapshot pairs.
#[derive(Debug, Clone)]
pub struct GraphDiffer {
    marker: String,
    activity: ActivityFlag,
}

impl Default for GraphDiffer {
    fn default() -> Self {
        Self::new()
    }
}

struct Reachable {
    ids: HashSet<u64>,
    size_bytes: u64,
}

#[derive(Default)]
struct ChangeAccum {
    size_bytes: i64,
    allocated: u64,
    freed: u64,
}

impl GraphDiffer {
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_MARKER)
    }

    /// A differ whose self-exclusion marker is `marker` instead of
    /// [`DEFAULT_MARKER`]. Adaptation layers that expose the diff session
    /// under a different object name pass that name here.
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            activity: ActivityFlag::new(),
        }
    }

    /// Handle to the flag this differ raises while a diff is in flight.
    ///
    /// Collection-event sources check it to suppress events caused by the
    /// diff itself.
    pub fn activity(&self) -> ActivityFlag {
        self.activity.clone()
    }

    /// Compare two snapshots of the same process lifetime.
    ///
    /// Pure with respect to its inputs: the same snapshot pair always
    /// produces the same report (modulo the caller-supplied timestamps).
    pub fn diff<S: HeapSnapshot>(
        &self,
        before: &S,
        after: &S,
        before_time: SystemTime,
        after_time: SystemTime,
    ) -> DiffReport {
        let _in_flight = self.activity.enter();

        let before_reachable = self.reachable(before);
        let after_reachable = self.reachable(after);

        let mut changes: BTreeMap<String, ChangeAccum> = BTreeMap::new();

        // before - after: identities no longer reachable, i.e. freed.
        let mut freed_nodes = 0u64;
        for &id in before_reachable.ids.difference(&after_reachable.ids) {
            freed_nodes += 1;
            if let Some(node) = before.node_by_id(id) {
                manage_change(&mut changes, node, false);
            }
        }

        // after - before: identities newly reachable, i.e. allocated.
        let mut allocated_nodes = 0u64;
        for &id in after_reachable.ids.difference(&before_reachable.ids) {
            allocated_nodes += 1;
            if let Some(node) = after.node_by_id(id) {
                manage_change(&mut changes, node, true);
            }
        }

        let size_delta =
            i64_bytes(after_reachable.size_bytes) - i64_bytes(before_reachable.size_bytes);

        tracing::debug!(
            target = "heapscope.diff",
            before_nodes = before_reachable.ids.len(),
            after_nodes = after_reachable.ids.len(),
            freed_nodes,
            allocated_nodes,
            size_delta,
            "heap diff computed"
        );

        DiffReport {
            before: summary(before, &before_reachable, before_time),
            after: summary(after, &after_reachable, after_time),
            change: HeapDelta {
                size_bytes: size_delta,
                size: nice_size(size_delta),
                freed_nodes,
                allocated_nodes,
                details: finish_changes(changes),
            },
        }
    }

    /// Walk the reachable graph from the snapshot root.
    ///
    /// Iterative depth-first with a visited set: every node is processed at
    /// most once no matter how many edges point at it, and cycles
    /// terminate. Marker-named objects are skipped outright (their
    /// exclusive descendants stay unvisited); hidden nodes are visited but
    /// contribute no bytes.
    fn reachable<S: HeapSnapshot>(&self, snapshot: &S) -> Reachable {
        let mut ids = HashSet::new();
        let mut size_bytes = 0u64;
        let mut stack = vec![snapshot.root_id()];

        while let Some(id) = stack.pop() {
            if ids.contains(&id) {
                continue;
            }
            let Some(node) = snapshot.node_by_id(id) else {
                continue;
            };
            if node.category == NodeCategory::Object && node.name == self.marker {
                continue;
            }

            ids.insert(id);
            if node.category != NodeCategory::Hidden {
                size_bytes = size_bytes.saturating_add(node.self_size);
            }
            stack.extend_from_slice(snapshot.children_of(id));
        }

        Reachable { ids, size_bytes }
    }
}

fn summary<S: HeapSnapshot>(snapshot: &S, reachable: &Reachable, time: SystemTime) -> SnapshotSummary {
    SnapshotSummary {
        nodes: snapshot.node_count(),
        time: unix_seconds(time),
        size_bytes: reachable.size_bytes,
        size: nice_size(i64_bytes(reachable.size_bytes)),
    }
}

fn manage_change(changes: &mut BTreeMap<String, ChangeAccum>, node: NodeInfo<'_>, added: bool) {
    let label = match node.category {
        // Hidden nodes never enter the changeset.
        NodeCategory::Hidden => return,
        NodeCategory::Object => node.name.to_owned(),
        other => other.label().to_owned(),
    };

    let entry = changes.entry(label).or_default();
    let bytes = i64_bytes(node.self_size);
    if added {
        entry.size_bytes = entry.size_bytes.saturating_add(bytes);
        entry.allocated += 1;
    } else {
        entry.size_bytes = entry.size_bytes.saturating_sub(bytes);
        entry.freed += 1;
    }
}

fn finish_changes(changes: BTreeMap<String, ChangeAccum>) -> Changeset {
    changes
        .into_iter()
        .map(|(label, accum)| {
            (
                label,
                CategoryChange {
                    size_bytes: accum.size_bytes,
                    size: nice_size(accum.size_bytes),
                    allocated: accum.allocated,
                    freed: accum.freed,
                },
            )
        })
        .collect()
}

fn i64_bytes(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}
