use super::*;
use crate::condition::Operand;
use crate::manager::IndexCreationRequest;
use crate::metrics::NoopSink;
use crate::row::Scalar;
use crate::{IndexManagerConfig, StatisticsConfig, TriggerConfig};
use std::sync::Arc;

fn manager() -> IndexManager {
    IndexManager::new(IndexManagerConfig::default(), TriggerConfig::default(), StatisticsConfig::default(), Arc::new(NoopSink))
}

#[test]
fn hash_wins_equality_and_btree_wins_range_with_equal_stats() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("col_hash", "t", vec!["col".into()], IndexKind::Hash)).unwrap();
    mgr.create_index(IndexCreationRequest::new("col_btree", "t", vec!["col".into()], IndexKind::BTree)).unwrap();
    let optimizer = QueryOptimizer::new(&mgr);

    let eq_query = LogicalQuery::new("t", vec![Condition::simple("col", Operator::Eq, Operand::Scalar(Scalar::Int(7)))], None);
    let eq_path = optimizer.plan(&eq_query).unwrap();
    assert_eq!(eq_path.index_name, "col_hash");

    let range_query = LogicalQuery::new(
        "t",
        vec![Condition::simple("col", Operator::Between, Operand::Range(Scalar::Int(1), Scalar::Int(10)))],
        None,
    );
    let range_path = optimizer.plan(&range_query).unwrap();
    assert_eq!(range_path.index_name, "col_btree");
    assert!(range_path.is_range_scan);
}

#[test]
fn no_usable_index_falls_through_to_none() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("other_col", "t", vec!["total".into()], IndexKind::BTree)).unwrap();
    let optimizer = QueryOptimizer::new(&mgr);

    let query = LogicalQuery::new("t", vec![Condition::simple("col", Operator::Eq, Operand::Scalar(Scalar::Int(7)))], None);
    assert!(optimizer.plan(&query).is_none());
}

#[test]
fn ordering_support_rewards_a_leading_btree_column() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("col_btree", "t", vec!["col".into()], IndexKind::BTree)).unwrap();
    let optimizer = QueryOptimizer::new(&mgr);

    let query = LogicalQuery::new("t", vec![Condition::simple("col", Operator::Eq, Operand::Scalar(Scalar::Int(7)))], Some("col".to_string()));
    let path = optimizer.plan(&query).unwrap();
    assert!(path.supports_ordering);
}

#[test]
fn fragmented_index_is_penalized_but_still_usable() {
    let mgr = manager();
    mgr.create_index(IndexCreationRequest::new("col_btree", "t", vec!["col".into()], IndexKind::BTree)).unwrap();
    mgr.collect_stats("col_btree", chrono::Utc::now());

    let optimizer = QueryOptimizer::new(&mgr);
    let query = LogicalQuery::new("t", vec![Condition::simple("col", Operator::Eq, Operand::Scalar(Scalar::Int(7)))], None);
    assert!(optimizer.plan(&query).is_some());
}
