/// The leak-detection window currently being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakWindow {
    /// When the first growth step of the window was observed, unix seconds.
    pub started_at: u64,
    /// Base occupancy at the first growth step, in bytes.
    pub start_occupancy_bytes: u64,
}

/// Running aggregates over all observed collection events.
///
/// An explicit state object created with its monitor and living as long as
/// the process does; it is only ever mutated by
/// [`GcTrendMonitor::observe`](crate::GcTrendMonitor::observe).
///
/// `base_recent` and `base_ancient` are always finite and non-negative:
/// every update clamps non-finite intermediate results back to a neutral
/// value instead of letting one anomalous reading poison the state.
#[derive(Debug, Clone, Default)]
pub struct RunningGcStats {
    /// Full (mark/sweep/compact) collections observed.
    pub num_full_gc: u64,
    /// Incremental collections observed.
    pub num_inc_gc: u64,
    /// Compacting collections observed; the sample count for trend math.
    pub heap_compactions: u64,

    /// Base occupancy right after the most recent compaction, in bytes.
    pub last_base: u64,
    /// Estimated base occupancy over roughly the last `recent_period`
    /// compactions.
    pub base_recent: f64,
    /// Estimated base occupancy over roughly the last `ancient_period`
    /// compactions.
    pub base_ancient: f64,

    /// Extremes of `last_base`, unset until enough compactions have been
    /// observed for startup noise to settle.
    pub base_min: Option<u64>,
    pub base_max: Option<u64>,

    /// Back-to-back compactions whose base strictly exceeded the previous
    /// one; resets to zero on any non-growth step.
    pub consecutive_growth: u32,
    /// Window state while `consecutive_growth > 0`.
    pub leak_window: Option<LeakWindow>,
}
