use serde::{Deserialize, Serialize};

/// Periodic statistics summary, emitted after a compacting collection when
/// at least one consumer is subscribed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcStatsReport {
    pub num_full_gc: u64,
    pub num_inc_gc: u64,
    pub heap_compactions: u64,
    /// Recent-vs-ancient base divergence as a percentage, one decimal
    /// place; 0 while the ancient average is still zero.
    pub usage_trend: f64,
    /// Recent base average, rounded to whole bytes.
    pub estimated_base: u64,
    /// Base occupancy after the collection this report follows.
    pub current_base: u64,
    /// Extremes of the observed base; `None` until startup noise settled.
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// Leak alert: base occupancy grew across the configured number of
/// consecutive compacting collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReport {
    /// Window start, unix seconds.
    pub start: u64,
    /// Window end (the collection that completed the window), unix seconds.
    pub end: u64,
    /// Base-occupancy growth across the window, in bytes.
    pub growth_bytes: u64,
    /// Human-readable summary with the window duration and growth rate.
    pub reason: String,
}

/// One report delivered to subscribed consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorReport {
    Stats(GcStatsReport),
    Leak(LeakReport),
}
