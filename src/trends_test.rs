use super::*;
use crate::config::StatisticsConfig;
use crate::stats::IndexStats;
use chrono::TimeZone;

fn t(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
}

#[test]
fn detects_increasing_growth_trend() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    for i in 0..10i64 {
        let mut s = IndexStats::new("idx", "t", "btree", t(i));
        s.size.total_entries = 100 + (i as u64) * 50;
        store.save_stats(s, t(i));
    }
    let analyzer = TrendAnalyzer::new(&store);
    let analysis = analyzer.analyze_growth_patterns("idx", 30, t(9)).unwrap();
    assert_eq!(analysis.trend_type, TrendType::Increasing);
    assert!(analysis.slope > 0.0);
    assert!(analysis.growth_rate_per_day > 0.0);
}

#[test]
fn stable_series_has_near_zero_slope() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    for i in 0..10i64 {
        let mut s = IndexStats::new("idx", "t", "btree", t(i));
        s.usage.avg_read_time_ms = 5.0;
        store.save_stats(s, t(i));
    }
    let analyzer = TrendAnalyzer::new(&store);
    let analysis = analyzer.analyze_performance_trends("idx", 30, t(9)).unwrap();
    assert_eq!(analysis.trend_type, TrendType::Stable);
}

#[test]
fn flags_outlier_as_anomaly() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    for i in 0..10i64 {
        let mut s = IndexStats::new("idx", "t", "btree", t(i));
        s.usage.avg_read_time_ms = if i == 5 { 500.0 } else { 5.0 };
        store.save_stats(s, t(i));
    }
    let analyzer = TrendAnalyzer::new(&store);
    let analysis = analyzer.analyze_performance_trends("idx", 30, t(9)).unwrap();
    assert!(!analysis.anomalies.is_empty());
}

#[test]
fn condition_effectiveness_requires_condition_stats_on_every_record() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    store.save_stats(IndexStats::new("idx", "t", "btree", t(0)), t(0));
    let analyzer = TrendAnalyzer::new(&store);
    assert!(analyzer.analyze_condition_effectiveness("idx", 30, t(0)).is_none());
}

#[test]
fn empty_history_returns_none() {
    let store = StatisticsStore::new(StatisticsConfig::default());
    let analyzer = TrendAnalyzer::new(&store);
    assert!(analyzer.analyze_performance_trends("missing", 30, t(0)).is_none());
}
