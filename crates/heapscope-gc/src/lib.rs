//! Garbage-collection trend monitoring.
//!
//! [`GcTrendMonitor`] consumes a stream of collection-completed events and
//! maintains decayed moving averages of the "base" heap occupancy: usage
//! measured right after a full/compacting collection, when live temporaries
//! are gone. From those it derives periodic statistics summaries and, when
//! base occupancy grows across several consecutive compactions, a leak
//! alert.
//!
//! Reports are delivered over an outbound channel
//! ([`GcTrendMonitor::subscribe`]) rather than by calling back into the
//! host: host collectors commonly forbid re-entrant heap operations from
//! inside a collection callback, so delivery is the consumer's loop to
//! drive.

mod config;
mod monitor;
mod report;
mod stats;

pub use config::TrendConfig;
pub use monitor::{CollectionKind, GcEvent, GcTrendMonitor};
pub use report::{GcStatsReport, LeakReport, MonitorReport};
pub use stats::{LeakWindow, RunningGcStats};
