#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use heapscope_diff::GraphDiffer;
use heapscope_heap::{HeapSnapshot, NodeCategory, SyntheticSnapshot};
use std::time::UNIX_EPOCH;

const MAX_NODES: usize = 64;
const MAX_EDGES_PER_NODE: usize = 8;

#[derive(Arbitrary, Debug)]
struct FuzzNode {
    category: u8,
    name: u8,
    self_size: u16,
    children: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
struct FuzzPair {
    before: Vec<FuzzNode>,
    after: Vec<FuzzNode>,
}

fn category(tag: u8) -> NodeCategory {
    match tag % 9 {
        0 => NodeCategory::Array,
        1 => NodeCategory::String,
        2 => NodeCategory::Object,
        3 => NodeCategory::Code,
        4 => NodeCategory::Closure,
        5 => NodeCategory::RegExp,
        6 => NodeCategory::Number,
        7 => NodeCategory::Native,
        _ => NodeCategory::Hidden,
    }
}

fn name(tag: u8) -> &'static str {
    // Include the differ's own marker so self-exclusion is exercised.
    match tag % 4 {
        0 => "",
        1 => "HeapDiff",
        2 => "Widget",
        _ => "Buffer",
    }
}

fn build(nodes: &[FuzzNode]) -> Option<SyntheticSnapshot> {
    let count = nodes.len().min(MAX_NODES);
    if count == 0 {
        return None;
    }

    let mut builder = SyntheticSnapshot::builder().root(0);
    for (id, node) in nodes.iter().take(count).enumerate() {
        let id = id as u64;
        builder = match category(node.category) {
            NodeCategory::Object => {
                builder.object(id, name(node.name), u64::from(node.self_size))
            }
            other => builder.node(id, other, u64::from(node.self_size)),
        };
        // Edge targets wrap into the declared id range, so cycles,
        // self-loops and diamonds all come up.
        for &child in node.children.iter().take(MAX_EDGES_PER_NODE) {
            builder = builder.edge(id, u64::from(child) % count as u64);
        }
    }

    Some(builder.build().expect("all ids are in range"))
}

fuzz_target!(|pair: FuzzPair| {
    let (Some(before), Some(after)) = (build(&pair.before), build(&pair.after)) else {
        return;
    };

    let differ = GraphDiffer::new();
    let report = differ.diff(&before, &after, UNIX_EPOCH, UNIX_EPOCH);

    assert!(report.change.freed_nodes <= before.node_count());
    assert!(report.change.allocated_nodes <= after.node_count());

    // A snapshot diffed against itself reports no movement, whatever the
    // graph shape.
    let same = differ.diff(&before, &before.clone(), UNIX_EPOCH, UNIX_EPOCH);
    assert_eq!(same.change.size_bytes, 0);
    assert_eq!(same.change.freed_nodes, 0);
    assert_eq!(same.change.allocated_nodes, 0);
    assert!(same.change.details.is_empty());
});
