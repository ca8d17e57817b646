use super::*;
use crate::condition::{Condition, Operator};
use crate::index::btree::BTreeIndex;
use crate::index::{IndexKind, IndexMetadata};
use crate::row::{Rid, Row, Scalar};

fn meta() -> IndexMetadata {
    IndexMetadata::new("active_over_30", "users", vec!["id".into()], IndexKind::Partial)
}

fn condition() -> Condition {
    Condition::and(vec![
        Condition::simple("status", Operator::Eq, crate::condition::Operand::Scalar(Scalar::Str("active".into()))),
        Condition::simple("age", Operator::Gt, crate::condition::Operand::Scalar(Scalar::Int(30))),
    ])
}

fn row(id: u64, status: &str, age: i64) -> Row {
    Row::new(Rid(id)).with("status", Scalar::Str(status.into())).with("age", Scalar::Int(age))
}

#[test]
fn scenario_partial_index_selectivity() {
    let inner = Box::new(BTreeIndex::new(meta(), 4));
    let mut idx = PartialIndex::new(meta(), inner, condition());

    let rows = [row(1, "active", 35), row(2, "active", 25), row(3, "inactive", 40), row(4, "active", 45)];
    for r in &rows {
        idx.insert_with_row(Key::Int(r.rid.0 as i64), r.rid, r).unwrap();
    }

    assert_eq!(idx.included_count(), 2);
    assert_eq!(idx.excluded_count(), 2);
    assert_eq!(idx.selectivity(), 0.5);
}

#[test]
fn search_with_row_short_circuits_when_condition_rejects() {
    let inner = Box::new(BTreeIndex::new(meta(), 4));
    let mut idx = PartialIndex::new(meta(), inner, condition());
    let r1 = row(1, "active", 35);
    idx.insert_with_row(Key::Int(1), Rid(1), &r1).unwrap();

    let excluded_row = row(2, "inactive", 10);
    let got = idx.search_with_row(&Key::Int(1), Some(&excluded_row)).unwrap();
    assert!(got.is_empty());

    let got2 = idx.search_with_row(&Key::Int(1), Some(&r1)).unwrap();
    assert_eq!(got2, vec![Rid(1)]);
}
