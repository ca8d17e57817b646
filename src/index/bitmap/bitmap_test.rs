use super::*;
use crate::index::{IndexKind, IndexMetadata};

fn meta() -> IndexMetadata {
    IndexMetadata::new("by_status", "users", vec!["status".into()], IndexKind::Bitmap)
}

fn scenario_ids(encoding: Encoding) -> Vec<u64> {
    let mut idx = BitmapIndex::new(meta(), encoding, None);
    for rid in [0u64, 1, 3, 4, 5, 7] {
        idx.insert(Key::Str("A".into()), Rid(rid)).unwrap();
    }
    let mut got: Vec<u64> = idx.search(&Key::Str("A".into())).unwrap().into_iter().map(|r| r.0).collect();
    got.sort_unstable();
    got
}

#[test]
fn scenario_bitmap_encodings_agree() {
    let expect = vec![0u64, 1, 3, 4, 5, 7];
    assert_eq!(scenario_ids(Encoding::Uncompressed), expect);
    assert_eq!(scenario_ids(Encoding::Wah), expect);
    assert_eq!(scenario_ids(Encoding::Concise), expect);
    assert_eq!(scenario_ids(Encoding::Roaring), expect);
}

#[test]
fn delete_tombstones_until_rebuild() {
    let mut idx = BitmapIndex::new(meta(), Encoding::Wah, None);
    idx.insert(Key::Str("A".into()), Rid(0)).unwrap();
    idx.insert(Key::Str("A".into()), Rid(1)).unwrap();
    idx.delete(&Key::Str("A".into()), Rid(0)).unwrap();
    assert_eq!(idx.search(&Key::Str("A".into())).unwrap(), vec![Rid(1)]);
    idx.rebuild().unwrap();
    assert_eq!(idx.search(&Key::Str("A".into())).unwrap(), vec![Rid(1)]);
}

#[test]
fn range_ors_bitmaps_in_key_order() {
    let mut idx = BitmapIndex::new(meta(), Encoding::Roaring, None);
    idx.insert(Key::Int(1), Rid(0)).unwrap();
    idx.insert(Key::Int(2), Rid(1)).unwrap();
    idx.insert(Key::Int(3), Rid(2)).unwrap();
    let mut got: Vec<u64> = idx.range(&Key::Int(1), &Key::Int(2)).unwrap().into_iter().map(|r| r.0).collect();
    got.sort_unstable();
    assert_eq!(got, vec![0, 1]);
}

#[test]
fn cardinality_guard_rejects_new_distinct_values_past_threshold() {
    let mut idx = BitmapIndex::new(meta(), Encoding::Uncompressed, Some(2));
    idx.insert(Key::Str("A".into()), Rid(0)).unwrap();
    idx.insert(Key::Str("B".into()), Rid(1)).unwrap();
    let err = idx.insert(Key::Str("C".into()), Rid(2)).unwrap_err();
    assert!(matches!(err, Error::CardinalityExceeded { .. }));
    // re-inserting an existing value is still fine, it's not a new distinct value
    idx.insert(Key::Str("A".into()), Rid(3)).unwrap();
}

#[test]
fn round_trip_property_across_encodings() {
    for encoding in [Encoding::Uncompressed, Encoding::Wah, Encoding::Concise, Encoding::Roaring] {
        let mut idx = BitmapIndex::new(meta(), encoding, None);
        let mut state = 555u64;
        let mut expected = Vec::new();
        for rid in 0..2000u64 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            if (state >> 62) == 0 {
                idx.insert(Key::Str("A".into()), Rid(rid)).unwrap();
                expected.push(rid);
            }
        }
        let mut got: Vec<u64> = idx.search(&Key::Str("A".into())).unwrap().into_iter().map(|r| r.0).collect();
        got.sort_unstable();
        assert_eq!(got, expected, "encoding {:?}", encoding);
    }
}
