use super::*;
use crate::condition::{Condition, Operand, Operator};
use crate::index::IndexKind;
use crate::metrics::NoopSink;
use crate::row::{Row, Scalar};
use std::sync::Arc;

fn manager() -> IndexManager {
    IndexManager::new(
        IndexManagerConfig::default(),
        TriggerConfig::default(),
        StatisticsConfig::default(),
        Arc::new(NoopSink),
    )
}

fn row(id: u64, age: i64) -> Row {
    Row::new(Rid(id)).with("age", Scalar::Int(age))
}

#[test]
fn create_index_rejects_duplicate_name() {
    let mgr = manager();
    let req = IndexCreationRequest::new("age_idx", "users", vec!["age".into()], IndexKind::BTree);
    mgr.create_index(req).unwrap();

    let dup = IndexCreationRequest::new("age_idx", "users", vec!["age".into()], IndexKind::Hash);
    let err = mgr.create_index(dup).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
}

#[test]
fn drop_index_is_idempotent() {
    let mgr = manager();
    let req = IndexCreationRequest::new("age_idx", "users", vec!["age".into()], IndexKind::BTree);
    mgr.create_index(req).unwrap();

    assert!(mgr.drop_index("age_idx"));
    assert!(!mgr.drop_index("age_idx"));
}

#[test]
fn list_indexes_filters_by_table() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("a", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    mgr.create_index(IndexCreationRequest::new("b", "orders", vec!["total".into()], IndexKind::BTree)).unwrap();

    let users = mgr.list_indexes(Some("users"));
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "a");
    assert_eq!(mgr.list_indexes(None).len(), 2);
}

#[test]
fn insert_row_dispatches_to_every_index_on_the_table() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    mgr.create_index(IndexCreationRequest::new("age_hash", "users", vec!["age".into()], IndexKind::Hash)).unwrap();
    mgr.create_index(IndexCreationRequest::new("other_table", "orders", vec!["total".into()], IndexKind::BTree)).unwrap();

    let r = row(1, 30);
    let failed = mgr.insert_row("users", &r);
    assert!(failed.is_empty());

    assert_eq!(mgr.search("age_btree", &Key::Int(30)).unwrap(), vec![Rid(1)]);
    assert_eq!(mgr.search("age_hash", &Key::Int(30)).unwrap(), vec![Rid(1)]);
}

#[test]
fn insert_row_reports_failed_indexes_without_stopping_others() {
    let mgr = manager();
    let mut props = Properties::new();
    props.insert("max_distinct_values".into(), serde_json::json!(1));
    let req = IndexCreationRequest::new("age_bitmap", "users", vec!["age".into()], IndexKind::Bitmap).properties_from(props);
    mgr.create_index(req).unwrap();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();

    assert!(mgr.insert_row("users", &row(1, 30)).is_empty());
    let failed = mgr.insert_row("users", &row(2, 31));
    assert_eq!(failed, vec!["age_bitmap".to_string()]);
    assert_eq!(mgr.search("age_btree", &Key::Int(31)).unwrap(), vec![Rid(2)]);
}

#[test]
fn delete_row_removes_from_every_index() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    let r = row(1, 30);
    mgr.insert_row("users", &r);
    let failed = mgr.delete_row("users", r.rid, &r);
    assert!(failed.is_empty());
    assert!(mgr.search("age_btree", &Key::Int(30)).unwrap().is_empty());
}

#[test]
fn partial_index_excludes_rows_that_fail_the_condition() {
    let mgr = manager();
    let condition = Condition::simple("age", Operator::Ge, Operand::Scalar(Scalar::Int(18)));
    mgr.create_partial_index("adult_age", "users", vec!["age".into()], condition, IndexKind::BTree, Properties::new()).unwrap();

    mgr.insert_row("users", &row(1, 10));
    mgr.insert_row("users", &row(2, 25));

    assert!(mgr.search("adult_age", &Key::Int(10)).unwrap().is_empty());
    assert_eq!(mgr.search("adult_age", &Key::Int(25)).unwrap(), vec![Rid(2)]);
}

#[test]
fn rebuild_index_reports_success() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    mgr.insert_row("users", &row(1, 30));
    assert!(mgr.rebuild_index("age_btree"));
    assert!(!mgr.rebuild_index("missing"));
}

#[test]
fn collect_stats_and_get_index_statistics_round_trip() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    mgr.insert_row("users", &row(1, 30));
    mgr.collect_stats("age_btree", Utc::now());

    let stats = mgr.get_index_statistics("age_btree").unwrap();
    assert_eq!(stats.index_name, "age_btree");
    assert_eq!(stats.size.total_entries, 1);
}

#[test]
fn run_maintenance_tick_fires_rebuild_for_high_fragmentation() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_bitmap", "users", vec!["age".into()], IndexKind::Bitmap)).unwrap();

    for i in 0..10u64 {
        mgr.insert_row("users", &row(i, i as i64));
    }
    for i in 0..8u64 {
        mgr.delete_row("users", Rid(i), &row(i, i as i64));
    }

    let now = Utc::now();
    mgr.run_maintenance_tick(now);
    std::thread::sleep(std::time::Duration::from_millis(200));

    let stats = mgr.get_index_statistics("age_bitmap").unwrap();
    assert!(stats.size.fragmentation_ratio > 0.3);
}

#[test]
fn health_classifies_by_error_count_and_fragmentation() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("age_btree", "users", vec!["age".into()], IndexKind::BTree)).unwrap();
    mgr.collect_stats("age_btree", Utc::now());
    assert_eq!(mgr.health("age_btree"), Some(IndexHealth::Healthy));
    assert_eq!(mgr.health("missing"), None);
}

#[test]
fn optimize_indexes_requires_advisor_enabled() {
    let mut config = IndexManagerConfig::default();
    config.enable_advisor = false;
    let mgr = IndexManager::new(config, TriggerConfig::default(), StatisticsConfig::default(), Arc::new(NoopSink));
    assert!(mgr.optimize_indexes("users").is_err());
    assert!(mgr.analyze_index_usage("users").is_err());
}

#[test]
fn optimize_indexes_creates_recommended_index_from_query_patterns() {
    let mgr = manager();
    for _ in 0..5 {
        mgr.record_query_pattern(crate::advisor::QueryPattern::new("users", vec!["age".into()], true, false), None);
    }
    let applied = mgr.optimize_indexes("users").unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(mgr.list_indexes(Some("users")).len(), 1);
}
