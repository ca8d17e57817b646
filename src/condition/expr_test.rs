use super::*;
use crate::row::Row;

fn row(age: i64, status: &str) -> Row {
    Row::new(crate::row::Rid(1))
        .with("age", Scalar::Int(age))
        .with("status", Scalar::Str(status.to_string()))
}

#[test]
fn evaluates_arithmetic_and_comparison() {
    let e = Expr::parse("age > 30").unwrap();
    assert_eq!(eval_bool(&e, &row(35, "active")), Some(true));
    assert_eq!(eval_bool(&e, &row(20, "active")), Some(false));
}

#[test]
fn evaluates_conjunction() {
    let e = Expr::parse("age > 30 AND status = 'active'").unwrap();
    assert_eq!(eval_bool(&e, &row(35, "active")), Some(true));
    assert_eq!(eval_bool(&e, &row(35, "inactive")), Some(false));
}

#[test]
fn missing_column_is_none_not_panic() {
    let e = Expr::parse("missing > 30").unwrap();
    assert_eq!(eval_bool(&e, &row(35, "active")), None);
}

#[test]
fn rejects_anything_outside_the_grammar() {
    assert!(Expr::parse("__import__('os')").is_err());
    assert!(Expr::parse("age; rm -rf").is_err());
}

#[test]
fn recognizes_single_comparison_shape() {
    let e = Expr::parse("age > 30").unwrap();
    let (col, op, val) = e.as_single_comparison().unwrap();
    assert_eq!(col, "age");
    assert_eq!(op, crate::condition::Operator::Gt);
    assert_eq!(val, &Scalar::Float(30.0));
}
