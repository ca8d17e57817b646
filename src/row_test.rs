use super::*;

#[test]
fn scalar_ordering_across_numeric_kinds() {
    assert!(Scalar::Int(1) < Scalar::Int(2));
    assert!(Scalar::Int(1) < Scalar::Float(1.5));
    assert_eq!(
        Scalar::Float(3.0).partial_cmp(&Scalar::Int(3)),
        Some(std::cmp::Ordering::Equal)
    );
    assert_eq!(Scalar::Str("a".into()).partial_cmp(&Scalar::Int(1)), None);
}

#[test]
fn row_source_iterates_in_insertion_order() {
    let rows = vec![
        Row::new(Rid(1)).with("age", Scalar::Int(30)),
        Row::new(Rid(2)).with("age", Scalar::Int(40)),
    ];
    let src = VecRowSource::new(rows);
    let collected: Vec<_> = src.iterate().collect();
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].rid, Rid(1));
    assert_eq!(collected[1].get("age"), Some(&Scalar::Int(40)));
}
