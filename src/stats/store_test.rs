use super::*;
use crate::stats::IndexStats;
use chrono::TimeZone;

fn t(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()
}

#[test]
fn latest_stats_returns_most_recent_record() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    let mut s1 = IndexStats::new("idx", "t", "btree", t(0));
    s1.size.total_entries = 10;
    store.save_stats(s1, t(0));

    let mut s2 = IndexStats::new("idx", "t", "btree", t(1));
    s2.size.total_entries = 20;
    store.save_stats(s2, t(1));

    let latest = store.latest_stats("idx").unwrap();
    assert_eq!(latest.size.total_entries, 20);
}

#[test]
fn stats_history_filters_by_time_window() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    for h in 0..5 {
        store.save_stats(IndexStats::new("idx", "t", "btree", t(h)), t(h));
    }
    let hist = store.stats_history("idx", Some(t(1)), Some(t(3)));
    assert_eq!(hist.len(), 3);
}

#[test]
fn snapshot_taken_on_first_save_and_after_interval() {
    let mut config = StatisticsConfig::default();
    config.snapshot_interval_seconds = 3600;
    let store = StatisticsStore::new(config);

    store.save_stats(IndexStats::new("idx", "t", "btree", t(0)), t(0));
    assert!(!store.snapshots("idx", "size", 10).is_empty());

    store.save_stats(IndexStats::new("idx", "t", "btree", t(0)), t(0).checked_add_signed(Duration::minutes(10)).unwrap());
    let after_short_gap = store.snapshots("idx", "size", 10).len();

    store.save_stats(IndexStats::new("idx", "t", "btree", t(2)), t(2));
    let after_long_gap = store.snapshots("idx", "size", 10).len();
    assert!(after_long_gap > after_short_gap);
}

#[test]
fn expire_older_than_drops_stale_records() {
    let mut config = StatisticsConfig::default();
    config.retention_days = 1;
    let store = StatisticsStore::new(config);
    store.save_stats(IndexStats::new("idx", "t", "btree", t(0)), t(0));

    let far_future = t(0) + Duration::days(5);
    store.expire_older_than(far_future);
    assert!(store.latest_stats("idx").is_none());
}
