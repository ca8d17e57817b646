use super::*;
use crate::index::{IndexKind, IndexMetadata};

fn meta() -> IndexMetadata {
    IndexMetadata::new("by_email", "users", vec!["email".into()], IndexKind::Hash)
}

#[test]
fn scenario_hash_rejects_range() {
    let idx = HashIndex::new(meta(), 16);
    let err = idx.range(&Key::Int(1), &Key::Int(10)).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn search_returns_all_rids_for_a_key_no_false_positives() {
    let mut idx = HashIndex::new(meta(), 4);
    idx.insert(Key::Str("a@x.com".into()), Rid(1)).unwrap();
    idx.insert(Key::Str("b@x.com".into()), Rid(2)).unwrap();
    idx.insert(Key::Str("a@x.com".into()), Rid(3)).unwrap();

    let mut got = idx.search(&Key::Str("a@x.com".into())).unwrap();
    got.sort_by_key(|r| r.0);
    assert_eq!(got, vec![Rid(1), Rid(3)]);
    assert_eq!(idx.search(&Key::Str("b@x.com".into())).unwrap(), vec![Rid(2)]);
    assert_eq!(idx.search(&Key::Str("c@x.com".into())).unwrap(), Vec::<Rid>::new());
}

#[test]
fn delete_removes_exact_rid_only() {
    let mut idx = HashIndex::new(meta(), 4);
    idx.insert(Key::Str("a".into()), Rid(1)).unwrap();
    idx.insert(Key::Str("a".into()), Rid(2)).unwrap();
    idx.delete(&Key::Str("a".into()), Rid(1)).unwrap();
    assert_eq!(idx.search(&Key::Str("a".into())).unwrap(), vec![Rid(2)]);
    assert!(idx.delete(&Key::Str("a".into()), Rid(99)).is_err());
}

#[test]
fn rebuild_preserves_all_entries() {
    let mut idx = HashIndex::new(meta(), 4);
    for i in 0..50 {
        idx.insert(Key::Int(i), Rid(i as u64)).unwrap();
    }
    idx.rebuild().unwrap();
    for i in 0..50 {
        assert_eq!(idx.search(&Key::Int(i)).unwrap(), vec![Rid(i as u64)]);
    }
    assert_eq!(idx.len(), 50);
}

#[test]
fn unique_index_rejects_duplicate_key() {
    let mut meta = meta();
    meta.unique = true;
    let mut idx = HashIndex::new(meta, 4);
    idx.insert(Key::Str("a".into()), Rid(1)).unwrap();
    assert!(idx.insert(Key::Str("a".into()), Rid(2)).is_err());
}
