use super::*;

#[test]
fn key_ordering_within_same_variant() {
    assert!(Key::Int(1) < Key::Int(2));
    assert!(Key::Str("a".into()) < Key::Str("b".into()));
}

#[test]
fn metadata_starts_in_created_state() {
    let meta = IndexMetadata::new("by_age", "people", vec!["age".into()], IndexKind::BTree);
    assert_eq!(meta.state, LifecycleState::Created);
    assert!(!meta.unique);
}
