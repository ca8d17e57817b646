use super::*;
use crate::index::btree::BTreeIndex;
use crate::index::hash::HashIndex;

fn meta(kind: IndexKind) -> IndexMetadata {
    IndexMetadata::new("by_status_age", "users", vec!["status".into(), "age".into()], kind)
}

fn tuple(status: &str, age: i64) -> Key {
    Key::Tuple(vec![Key::Str(status.into()), Key::Int(age)])
}

#[test]
fn prefix_search_over_btree_inner_finds_matching_rows() {
    let inner = Box::new(BTreeIndex::new(meta(IndexKind::Composite), 4));
    let mut idx = CompositeIndex::new(meta(IndexKind::Composite), inner);
    idx.insert(tuple("active", 20), Rid(1)).unwrap();
    idx.insert(tuple("active", 30), Rid(2)).unwrap();
    idx.insert(tuple("inactive", 40), Rid(3)).unwrap();

    let mut got: Vec<u64> = idx.search_prefix(&[Key::Str("active".into())]).unwrap().into_iter().map(|r| r.0).collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2]);
}

#[test]
fn full_tuple_search_and_delete_delegate_to_inner() {
    let inner = Box::new(BTreeIndex::new(meta(IndexKind::Composite), 4));
    let mut idx = CompositeIndex::new(meta(IndexKind::Composite), inner);
    idx.insert(tuple("active", 20), Rid(1)).unwrap();
    assert_eq!(idx.search(&tuple("active", 20)).unwrap(), vec![Rid(1)]);
    idx.delete(&tuple("active", 20), Rid(1)).unwrap();
    assert_eq!(idx.search(&tuple("active", 20)).unwrap(), Vec::<Rid>::new());
}

#[test]
fn prefix_search_rejected_on_non_btree_inner() {
    let inner = Box::new(HashIndex::new(meta(IndexKind::Composite), 8));
    let idx = CompositeIndex::new(meta(IndexKind::Composite), inner);
    let err = idx.search_prefix(&[Key::Str("active".into())]).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}
