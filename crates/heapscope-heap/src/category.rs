use serde::{Deserialize, Serialize};

/// Closed set of heap node categories.
///
/// `Hidden` nodes are runtime-internal bookkeeping; they participate in
/// graph traversal (identity sets must cover them) but are excluded from
/// byte totals and per-category aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Array,
    String,
    /// A plain object; the only category for which a node's display name
    /// is meaningful.
    Object,
    Code,
    Closure,
    RegExp,
    Number,
    Native,
    Hidden,
}

impl NodeCategory {
    /// Display label used as the aggregation key for non-`Object` nodes.
    pub fn label(self) -> &'static str {
        match self {
            NodeCategory::Array => "Array",
            NodeCategory::String => "String",
            NodeCategory::Object => "Object",
            NodeCategory::Code => "Code",
            NodeCategory::Closure => "Closure",
            NodeCategory::RegExp => "RegExp",
            NodeCategory::Number => "Number",
            NodeCategory::Native => "Native",
            NodeCategory::Hidden => "Hidden",
        }
    }
}
