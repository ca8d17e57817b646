use super::*;

#[test]
fn predicate_for_key_captures_exact_text() {
    let s = RegexStrategy;
    let p = s.predicate_for_key(&Key::Text("hello".into())).unwrap();
    assert_eq!(p.text.as_deref(), Some("hello"));
    assert_eq!(p.min_length, 5);
    assert_eq!(p.max_length, Some(5));
    assert!(!p.lossy);
}

#[test]
fn consistent_matches_literal_prefix_pattern() {
    let s = RegexStrategy;
    let entry = s.predicate_for_key(&Key::Text("hello world".into())).unwrap();
    let query = s.query_predicate(&Key::Text("^hello".into())).unwrap();
    assert!(s.consistent(&entry, &query));

    let miss = s.predicate_for_key(&Key::Text("goodbye".into())).unwrap();
    assert!(!s.consistent(&miss, &query));
}

#[test]
fn consistent_rejects_on_length_window() {
    let s = RegexStrategy;
    let entry = s.predicate_for_key(&Key::Text("ab".into())).unwrap();
    let query = s.query_predicate(&Key::Text("abcdefgh".into())).unwrap();
    assert!(!s.consistent(&entry, &query));
}

#[test]
fn union_keeps_common_prefix_and_suffix() {
    let s = RegexStrategy;
    let a = s.predicate_for_key(&Key::Text("prefix_one_suffix".into())).unwrap();
    let b = s.predicate_for_key(&Key::Text("prefix_two_suffix".into())).unwrap();
    let u = s.union(&[a, b]);
    assert!(u.prefix.starts_with("prefix_"));
    assert!(u.lossy);
}

#[test]
fn penalty_is_zero_for_identical_predicates() {
    let s = RegexStrategy;
    let a = s.predicate_for_key(&Key::Text("same".into())).unwrap();
    let b = s.predicate_for_key(&Key::Text("same".into())).unwrap();
    assert_eq!(s.penalty(&a, &b), 0.0);
}

#[test]
fn compress_truncates_long_text_into_skeleton() {
    let s = RegexStrategy;
    let long = "a".repeat(40);
    let p = s.predicate_for_key(&Key::Text(long)).unwrap();
    let c = s.compress(&p);
    assert!(c.text.is_none());
    assert!(c.lossy);
}
