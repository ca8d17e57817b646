use super::*;
use chrono::TimeZone;

#[test]
fn record_read_folds_into_running_average() {
    let mut usage = IndexUsageStats::default();
    let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    usage.record_read(10.0, t);
    usage.record_read(20.0, t);
    assert_eq!(usage.avg_read_time_ms, 15.0);
    assert_eq!(usage.total_reads, 2);
    assert_eq!(usage.last_used, Some(t));
}

#[test]
fn cache_hit_ratio_handles_no_samples() {
    let usage = IndexUsageStats::default();
    assert_eq!(usage.cache_hit_ratio(), 0.0);
}

#[test]
fn needs_optimization_flags_high_fragmentation() {
    let mut stats = IndexStats::new("idx", "t", "btree", Utc::now());
    stats.size.fragmentation_ratio = 0.5;
    assert!(stats.needs_optimization());
}

#[test]
fn needs_optimization_flags_high_false_positive_rate() {
    let mut stats = IndexStats::new("idx", "t", "partial", Utc::now());
    stats.condition = Some(IndexConditionStats {
        condition_string: "age > 30".into(),
        selectivity: 0.4,
        false_positive_rate: 0.5,
        evaluation_time_ms: 0.1,
        last_optimized: None,
    });
    assert!(stats.needs_optimization());
}
