use std::time::SystemTime;

use crossbeam_channel::{Receiver, Sender};
use heapscope_core::{nice_delta, nice_size, unix_seconds, ActivityFlag};

use crate::config::TrendConfig;
use crate::report::{GcStatsReport, LeakReport, MonitorReport};
use crate::stats::{LeakWindow, RunningGcStats};

/// What kind of collection an event describes.
///
/// Only compacting collections update base occupancy and trend state;
/// incremental collections merely count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Incremental,
    Compacting,
}

/// One completed collection, as reported by the host.
///
/// Events must arrive in the order the collector produced them; the
/// consecutive-growth heuristic and the decayed averages are both
/// order-sensitive and no reordering buffer is provided.
#[derive(Debug, Clone, Copy)]
pub struct GcEvent {
    /// Heap occupancy sampled right after the collection, in bytes.
    pub occupancy_bytes: u64,
    pub kind: CollectionKind,
    /// When the collection completed.
    pub at: SystemTime,
}

impl GcEvent {
    pub fn compacting(occupancy_bytes: u64, at: SystemTime) -> Self {
        Self {
            occupancy_bytes,
            kind: CollectionKind::Compacting,
            at,
        }
    }

    pub fn incremental(occupancy_bytes: u64, at: SystemTime) -> Self {
        Self {
            occupancy_bytes,
            kind: CollectionKind::Incremental,
            at,
        }
    }
}

/// Observes collection events and derives statistics and leak reports.
///
/// The monitor is synchronous and single-writer: one `observe` call is in
/// flight at a time (the host serializes collections), and the running
/// state is never touched by anything else. Derived reports go out over
/// the channels handed to subscribers, never by re-entrant callback.
#[derive(Debug)]
pub struct GcTrendMonitor {
    config: TrendConfig,
    stats: RunningGcStats,
    subscribers: Vec<Sender<MonitorReport>>,
    suppress_when: Option<ActivityFlag>,
}

impl Default for GcTrendMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl GcTrendMonitor {
    pub fn new() -> Self {
        Self::with_config(TrendConfig::default())
    }

    pub fn with_config(config: TrendConfig) -> Self {
        Self {
            config,
            stats: RunningGcStats::default(),
            subscribers: Vec::new(),
            suppress_when: None,
        }
    }

    pub fn config(&self) -> TrendConfig {
        self.config
    }

    /// The running aggregates, readable at any point between events.
    pub fn stats(&self) -> &RunningGcStats {
        &self.stats
    }

    /// Drop all accumulated state and start over.
    pub fn reset(&mut self) {
        self.stats = RunningGcStats::default();
    }

    /// Suppress events delivered while `flag` is raised.
    ///
    /// Wiring the differ's activity flag here keeps the differ's own
    /// transient allocations from being misread as application growth.
    pub fn suppress_when(&mut self, flag: ActivityFlag) {
        self.suppress_when = Some(flag);
    }

    /// Register a consumer; every subsequent report is delivered on the
    /// returned channel. Stats reports are only produced while at least
    /// one subscriber is registered.
    pub fn subscribe(&mut self) -> Receiver<MonitorReport> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Feed one collection event. Infallible: delivery failures prune the
    /// dead subscriber and anomalous numbers degrade to neutral values.
    pub fn observe(&mut self, event: GcEvent) {
        if let Some(flag) = &self.suppress_when {
            if flag.is_active() {
                tracing::trace!(
                    target = "heapscope.gc",
                    occupancy_bytes = event.occupancy_bytes,
                    "collection event during heap diff; suppressed"
                );
                return;
            }
        }

        match event.kind {
            CollectionKind::Incremental => {
                self.stats.num_inc_gc += 1;
                return;
            }
            CollectionKind::Compacting => {
                self.stats.num_full_gc += 1;
            }
        }

        self.track_leak_window(event.occupancy_bytes, event.at);

        self.stats.last_base = event.occupancy_bytes;
        self.stats.heap_compactions += 1;

        self.update_base_averages();
        self.update_extremes();

        if !self.subscribers.is_empty() {
            let report = self.stats_report();
            tracing::trace!(
                target = "heapscope.gc",
                current_base = report.current_base,
                estimated_base = report.estimated_base,
                usage_trend = report.usage_trend,
                "collection stats"
            );
            self.emit(MonitorReport::Stats(report));
        }
    }

    /// Consecutive-growth tracking; at most one leak report per window.
    fn track_leak_window(&mut self, occupancy_bytes: u64, at: SystemTime) {
        if occupancy_bytes <= self.stats.last_base {
            self.stats.consecutive_growth = 0;
            self.stats.leak_window = None;
            return;
        }

        let window = *self.stats.leak_window.get_or_insert(LeakWindow {
            started_at: unix_seconds(at),
            start_occupancy_bytes: occupancy_bytes,
        });
        self.stats.consecutive_growth += 1;

        if self.stats.consecutive_growth < self.config.leak_growth_threshold {
            return;
        }
        self.stats.consecutive_growth = 0;
        self.stats.leak_window = None;

        let report = self.leak_report(window, occupancy_bytes, at);
        tracing::warn!(
            target = "heapscope.gc",
            growth_bytes = report.growth_bytes,
            window_seconds = report.end.saturating_sub(report.start),
            "sustained base-occupancy growth across consecutive collections"
        );
        self.emit(MonitorReport::Leak(report));
    }

    fn leak_report(&self, window: LeakWindow, occupancy_bytes: u64, at: SystemTime) -> LeakReport {
        let start = window.started_at;
        let end = unix_seconds(at);
        let growth_bytes = occupancy_bytes.saturating_sub(window.start_occupancy_bytes);

        let elapsed = end.saturating_sub(start);
        // Rapid back-to-back collections can close a window within one
        // second; rate the growth over a floor of one second instead of
        // dividing by zero.
        let rate_seconds = elapsed.max(1);
        let per_hour = (growth_bytes as f64 * 3600.0 / rate_seconds as f64).round() as i64;

        let reason = format!(
            "heap growth over {} consecutive GCs ({}) - {}/hr",
            self.config.leak_growth_threshold,
            nice_delta(elapsed),
            nice_size(per_hour),
        );

        LeakReport {
            start,
            end,
            growth_bytes,
            reason,
        }
    }

    fn update_base_averages(&mut self) {
        let n = self.stats.heap_compactions;
        let sample = self.stats.last_base as f64;

        let (recent_weight, ancient_weight) = if n < self.config.recent_period {
            // Spin-up: damp the young averages so early fluctuation does
            // not dominate them.
            (
                spin_up_weight(n, self.config.recent_period, self.config.recent_spin_up_exponent),
                spin_up_weight(n, self.config.recent_period, self.config.ancient_spin_up_exponent),
            )
        } else {
            let ancient_decay = self.config.ancient_period.min(n) as f64;
            (self.config.recent_period as f64 - 1.0, ancient_decay - 1.0)
        };

        self.stats.base_recent = weighted_average(self.stats.base_recent, sample, recent_weight);
        self.stats.base_ancient = weighted_average(self.stats.base_ancient, sample, ancient_weight);
    }

    fn update_extremes(&mut self) {
        if self.stats.heap_compactions < self.config.extremes_after {
            return;
        }
        let base = self.stats.last_base;
        self.stats.base_min = Some(self.stats.base_min.map_or(base, |min| min.min(base)));
        self.stats.base_max = Some(self.stats.base_max.map_or(base, |max| max.max(base)));
    }

    fn stats_report(&self) -> GcStatsReport {
        let stats = &self.stats;

        let usage_trend = if stats.base_ancient > 0.0 {
            ((stats.base_recent - stats.base_ancient) / stats.base_ancient * 1000.0).round() / 10.0
        } else {
            0.0
        };

        GcStatsReport {
            num_full_gc: stats.num_full_gc,
            num_inc_gc: stats.num_inc_gc,
            heap_compactions: stats.heap_compactions,
            usage_trend,
            estimated_base: stats.base_recent.round() as u64,
            current_base: stats.last_base,
            min: stats.base_min,
            max: stats.base_max,
        }
    }

    fn emit(&mut self, report: MonitorReport) {
        self.subscribers
            .retain(|subscriber| subscriber.send(report.clone()).is_ok());
    }
}

/// History weight while an average is still spinning up:
/// `(n / window)^exponent * n`, degraded to 0 if the result is not finite.
fn spin_up_weight(n: u64, window: u64, exponent: f64) -> f64 {
    let weight = (n as f64 / window as f64).powf(exponent) * n as f64;
    if weight.is_finite() {
        weight
    } else {
        0.0
    }
}

/// One exponentially-weighted update step.
///
/// A non-finite or negative history weight is treated as zero decay (the
/// sample replaces the average) so a single degenerate value cannot poison
/// the running state.
fn weighted_average(average: f64, sample: f64, history_weight: f64) -> f64 {
    let weight = if history_weight.is_finite() && history_weight >= 0.0 {
        history_weight
    } else {
        0.0
    };
    let next = (average * weight + sample) / (weight + 1.0);
    if next.is_finite() {
        next
    } else {
        sample
    }
}
