use super::*;
use crate::index::IndexMetadata;

#[test]
fn recommends_hash_for_frequent_low_cardinality_equality_pattern() {
    let mut advisor = IndexAdvisor::new();
    advisor.record_column_stats("users", "status", ColumnStats { distinct_values: 3, null_count: 0, total_rows: 1000 });
    advisor.record_query_pattern(QueryPattern::new("users", vec!["status".into()], true, false));

    let recs = advisor.recommend_indexes("users", 5);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].kind, IndexKind::Hash);
}

#[test]
fn recommends_btree_for_range_pattern_regardless_of_cardinality() {
    let mut advisor = IndexAdvisor::new();
    advisor.record_column_stats("events", "ts", ColumnStats { distinct_values: 900, null_count: 0, total_rows: 1000 });
    advisor.record_query_pattern(QueryPattern::new("events", vec!["ts".into()], false, true));

    let recs = advisor.recommend_indexes("events", 5);
    assert_eq!(recs[0].kind, IndexKind::BTree);
}

#[test]
fn recommends_bitmap_with_compression_for_very_low_cardinality_large_table() {
    let mut advisor = IndexAdvisor::new();
    advisor.record_column_stats("logs", "level", ColumnStats { distinct_values: 5, null_count: 0, total_rows: 500_000 });
    advisor.record_query_pattern(QueryPattern::new("logs", vec!["level".into()], true, false));

    let recs = advisor.recommend_indexes("logs", 5);
    assert_eq!(recs[0].kind, IndexKind::Bitmap);
    assert!(recs[0].use_bitmap_compression);
}

#[test]
fn covered_pattern_is_not_recommended_again() {
    let mut advisor = IndexAdvisor::new();
    advisor.register_existing_index(IndexMetadata::new("users_status_idx", "users", vec!["status".into()], IndexKind::Hash));
    advisor.record_query_pattern(QueryPattern::new("users", vec!["status".into()], true, false));

    let recs = advisor.recommend_indexes("users", 5);
    assert!(recs.is_empty());
}

#[test]
fn most_frequent_pattern_is_recommended_first() {
    let mut advisor = IndexAdvisor::new();
    advisor.record_query_pattern(QueryPattern::new("t", vec!["a".into()], true, false));
    for _ in 0..5 {
        advisor.record_query_pattern(QueryPattern::new("t", vec!["b".into()], true, false));
    }
    let recs = advisor.recommend_indexes("t", 1);
    assert_eq!(recs[0].columns, vec!["b".to_string()]);
}
