use std::time::{Duration, SystemTime, UNIX_EPOCH};

use heapscope_core::ActivityFlag;
use heapscope_gc::{GcEvent, GcTrendMonitor, MonitorReport, TrendConfig};

const MB: u64 = 1024 * 1024;

fn at(seconds: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(seconds)
}

#[test]
fn five_consecutive_growths_emit_one_leak_report() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    let occupancies = [100 * MB, 110 * MB, 120 * MB, 130 * MB, 140 * MB];
    for (i, &occupancy) in occupancies.iter().enumerate() {
        monitor.observe(GcEvent::compacting(occupancy, at(1_000 + 4 * i as u64)));
    }

    let received: Vec<MonitorReport> = reports.try_iter().collect();
    let leaks: Vec<_> = received
        .iter()
        .filter_map(|report| match report {
            MonitorReport::Leak(leak) => Some(leak),
            MonitorReport::Stats(_) => None,
        })
        .collect();

    assert_eq!(leaks.len(), 1, "exactly one leak report");
    let leak = leaks[0];
    assert_eq!(leak.start, 1_000, "window opened at the first growth step");
    assert_eq!(leak.end, 1_016);
    assert_eq!(leak.growth_bytes, 40 * MB);
    assert_eq!(
        leak.reason,
        "heap growth over 5 consecutive GCs (16 seconds) - 8.8 gb/hr"
    );

    // The alert goes out before the 5th event's stats summary.
    assert!(matches!(received[4], MonitorReport::Leak(_)));
    assert!(matches!(received[5], MonitorReport::Stats(_)));
    assert_eq!(received.len(), 6);

    assert_eq!(monitor.stats().consecutive_growth, 0, "counter reset by the report");
    assert!(monitor.stats().leak_window.is_none());
}

#[test]
fn a_single_drop_abandons_the_leak_window() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    for (i, occupancy) in [100 * MB, 110 * MB, 95 * MB, 130 * MB, 140 * MB]
        .into_iter()
        .enumerate()
    {
        monitor.observe(GcEvent::compacting(occupancy, at(2_000 + i as u64)));
    }

    assert!(
        reports
            .try_iter()
            .all(|report| matches!(report, MonitorReport::Stats(_))),
        "no leak report in a run with a non-growth step"
    );
    assert_eq!(monitor.stats().consecutive_growth, 2, "130 and 140 restarted the count");
}

#[test]
fn leak_windows_reopen_after_an_alert() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    for i in 0..5u64 {
        monitor.observe(GcEvent::compacting((100 + 10 * i) * MB, at(3_000 + i)));
    }
    assert_eq!(
        reports
            .try_iter()
            .filter(|report| matches!(report, MonitorReport::Leak(_)))
            .count(),
        1
    );

    // The next growth step opens a fresh window.
    monitor.observe(GcEvent::compacting(150 * MB, at(3_100)));
    assert_eq!(monitor.stats().consecutive_growth, 1);
    let window = monitor.stats().leak_window.expect("window reopened");
    assert_eq!(window.started_at, 3_100);
    assert_eq!(window.start_occupancy_bytes, 150 * MB);
}

#[test]
fn sub_second_windows_still_report_a_rate() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    // All five collections complete within the same wall-clock second.
    for occupancy in [100 * MB, 110 * MB, 120 * MB, 130 * MB, 140 * MB] {
        monitor.observe(GcEvent::compacting(occupancy, at(5_000)));
    }

    let leak = reports
        .try_iter()
        .find_map(|report| match report {
            MonitorReport::Leak(leak) => Some(leak),
            MonitorReport::Stats(_) => None,
        })
        .expect("leak report");

    assert_eq!(leak.start, leak.end);
    // Rated over a one-second floor: 40mb/s scaled to an hourly figure.
    assert_eq!(
        leak.reason,
        "heap growth over 5 consecutive GCs (0 seconds) - 140.6 gb/hr"
    );
}

#[test]
fn incremental_collections_only_count() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    monitor.observe(GcEvent::incremental(64 * MB, at(100)));
    monitor.observe(GcEvent::incremental(65 * MB, at(101)));

    let stats = monitor.stats();
    assert_eq!(stats.num_inc_gc, 2);
    assert_eq!(stats.num_full_gc, 0);
    assert_eq!(stats.heap_compactions, 0);
    assert_eq!(stats.last_base, 0, "incremental events never touch base occupancy");
    assert_eq!(reports.try_iter().count(), 0, "no reports for incremental events");
}

#[test]
fn extremes_stay_unset_until_the_third_compaction() {
    let mut monitor = GcTrendMonitor::new();

    monitor.observe(GcEvent::compacting(50 * MB, at(1)));
    monitor.observe(GcEvent::compacting(40 * MB, at(2)));
    assert_eq!(monitor.stats().base_min, None);
    assert_eq!(monitor.stats().base_max, None);

    monitor.observe(GcEvent::compacting(45 * MB, at(3)));
    assert_eq!(monitor.stats().base_min, Some(45 * MB));
    assert_eq!(monitor.stats().base_max, Some(45 * MB));

    monitor.observe(GcEvent::compacting(60 * MB, at(4)));
    monitor.observe(GcEvent::compacting(44 * MB, at(5)));
    assert_eq!(monitor.stats().base_min, Some(44 * MB));
    assert_eq!(monitor.stats().base_max, Some(60 * MB));
}

#[test]
fn base_averages_converge_on_a_steady_heap() {
    let mut monitor = GcTrendMonitor::new();

    for i in 0..30u64 {
        monitor.observe(GcEvent::compacting(1_000, at(10 + i)));
    }

    let stats = monitor.stats();
    assert!(stats.base_recent.is_finite());
    assert!(stats.base_ancient.is_finite());
    assert!(stats.base_recent > 990.0 && stats.base_recent <= 1_000.0);
    assert!(stats.base_ancient > 900.0 && stats.base_ancient <= 1_000.0);
}

#[test]
fn degenerate_window_configs_keep_the_averages_finite() {
    // A zero-length window would divide the decay weight by zero; the
    // update must degrade to zero decay instead of going NaN.
    let config = TrendConfig {
        recent_period: 0,
        ancient_period: 0,
        ..TrendConfig::default()
    };
    let mut monitor = GcTrendMonitor::with_config(config);

    for i in 0..5u64 {
        monitor.observe(GcEvent::compacting(512 * MB, at(i)));
    }

    let stats = monitor.stats();
    assert!(stats.base_recent.is_finite());
    assert!(stats.base_ancient.is_finite());
    assert_eq!(stats.base_recent, (512 * MB) as f64, "zero decay tracks the sample");
    assert_eq!(stats.base_ancient, (512 * MB) as f64);
}

#[test]
fn stats_reports_carry_the_running_counters() {
    let mut monitor = GcTrendMonitor::new();

    monitor.observe(GcEvent::incremental(10 * MB, at(1)));
    let reports = monitor.subscribe();
    monitor.observe(GcEvent::compacting(80 * MB, at(2)));

    let report = match reports.try_recv().expect("stats report") {
        MonitorReport::Stats(report) => report,
        MonitorReport::Leak(_) => panic!("no leak expected"),
    };

    assert_eq!(report.num_full_gc, 1);
    assert_eq!(report.num_inc_gc, 1);
    assert_eq!(report.heap_compactions, 1);
    assert_eq!(report.current_base, 80 * MB);
    assert_eq!(report.estimated_base, monitor.stats().base_recent.round() as u64);
    assert_eq!(report.min, None);
    assert_eq!(report.max, None);
}

#[test]
fn usage_trend_is_zero_while_the_ancient_base_is_zero() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    monitor.observe(GcEvent::compacting(0, at(1)));

    let report = match reports.try_recv().expect("stats report") {
        MonitorReport::Stats(report) => report,
        MonitorReport::Leak(_) => panic!("no leak expected"),
    };
    assert_eq!(report.usage_trend, 0.0);
}

#[test]
fn usage_trend_tracks_recent_divergence_to_one_decimal() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    // Settle both averages, then grow.
    for i in 0..40u64 {
        monitor.observe(GcEvent::compacting(100 * MB, at(i)));
    }
    for i in 0..10u64 {
        monitor.observe(GcEvent::compacting(200 * MB, at(100 + i)));
    }

    let last_stats = reports
        .try_iter()
        .filter_map(|report| match report {
            MonitorReport::Stats(report) => Some(report),
            MonitorReport::Leak(_) => None,
        })
        .last()
        .expect("stats reports");

    let stats = monitor.stats();
    let expected =
        ((stats.base_recent - stats.base_ancient) / stats.base_ancient * 1000.0).round() / 10.0;
    assert_eq!(last_stats.usage_trend, expected);
    assert!(last_stats.usage_trend > 0.0, "recent base rose above the ancient one");
    let scaled = last_stats.usage_trend * 10.0;
    assert!((scaled - scaled.round()).abs() < 1e-9, "one decimal place");
}

#[test]
fn no_stats_are_computed_without_subscribers() {
    let mut monitor = GcTrendMonitor::new();

    monitor.observe(GcEvent::compacting(30 * MB, at(1)));
    assert_eq!(monitor.stats().heap_compactions, 1, "state advances regardless");

    let reports = monitor.subscribe();
    monitor.observe(GcEvent::compacting(31 * MB, at(2)));
    assert_eq!(reports.try_iter().count(), 1, "reports start with the subscription");
}

#[test]
fn dropped_subscribers_are_pruned() {
    let mut monitor = GcTrendMonitor::new();

    let kept = monitor.subscribe();
    let dropped = monitor.subscribe();
    drop(dropped);

    monitor.observe(GcEvent::compacting(10 * MB, at(1)));
    monitor.observe(GcEvent::compacting(11 * MB, at(2)));

    assert_eq!(kept.try_iter().count(), 2, "the live subscriber keeps receiving");
}

#[test]
fn events_during_a_diff_are_suppressed() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    let flag = ActivityFlag::new();
    monitor.suppress_when(flag.clone());

    {
        let _in_flight = flag.enter();
        monitor.observe(GcEvent::compacting(500 * MB, at(1)));
    }
    assert_eq!(monitor.stats().heap_compactions, 0, "diff-induced event dropped");
    assert_eq!(reports.try_iter().count(), 0);

    monitor.observe(GcEvent::compacting(40 * MB, at(2)));
    assert_eq!(monitor.stats().heap_compactions, 1);
    assert_eq!(monitor.stats().last_base, 40 * MB);
}

#[test]
fn reset_discards_all_accumulated_state() {
    let mut monitor = GcTrendMonitor::new();
    for i in 0..5u64 {
        monitor.observe(GcEvent::compacting((50 + i) * MB, at(i)));
    }
    assert!(monitor.stats().heap_compactions > 0);

    monitor.reset();
    let stats = monitor.stats();
    assert_eq!(stats.heap_compactions, 0);
    assert_eq!(stats.num_full_gc, 0);
    assert_eq!(stats.last_base, 0);
    assert_eq!(stats.base_recent, 0.0);
    assert_eq!(stats.base_min, None);
    assert_eq!(stats.consecutive_growth, 0);
}

#[test]
fn reports_serialize_with_their_kind_as_tag() {
    let mut monitor = GcTrendMonitor::new();
    let reports = monitor.subscribe();

    for i in 0..5u64 {
        monitor.observe(GcEvent::compacting((100 + 10 * i) * MB, at(9_000 + i)));
    }

    let received: Vec<MonitorReport> = reports.try_iter().collect();
    let stats_json = serde_json::to_value(&received[0]).unwrap();
    assert!(stats_json.get("stats").is_some());
    assert_eq!(stats_json["stats"]["heap_compactions"], 1);
    assert_eq!(stats_json["stats"]["min"], serde_json::Value::Null);

    let leak = received
        .iter()
        .find(|report| matches!(report, MonitorReport::Leak(_)))
        .expect("leak report");
    let leak_json = serde_json::to_value(leak).unwrap();
    assert!(leak_json.get("leak").is_some());
    assert_eq!(leak_json["leak"]["growth_bytes"], 40 * MB);
}
