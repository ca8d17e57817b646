use super::*;
use crate::geometry::Point;
use crate::index::{IndexKind, IndexMetadata};

fn meta() -> IndexMetadata {
    IndexMetadata::new("by_geom", "places", vec!["geom".into()], IndexKind::RTree)
}

fn bbox(x: f64, y: f64) -> Key {
    Key::BBox(BoundingBox::new(vec![x, y], vec![x, y]))
}

#[test]
fn window_search_returns_every_intersecting_entry() {
    let mut idx = RTreeIndex::new(meta(), 4);
    for (i, (x, y)) in [(0.0, 0.0), (1.0, 1.0), (5.0, 5.0), (9.0, 9.0), (2.0, 8.0), (8.0, 2.0)]
        .into_iter()
        .enumerate()
    {
        idx.insert(bbox(x, y), Rid(i as u64)).unwrap();
    }
    let window = Key::BBox(BoundingBox::new(vec![0.0, 0.0], vec![5.5, 5.5]));
    let mut got: Vec<u64> = idx.search(&window).unwrap().into_iter().map(|r| r.0).collect();
    got.sort_unstable();
    assert_eq!(got, vec![0, 1, 2]);
}

#[test]
fn splits_when_fanout_exceeded_and_stays_searchable() {
    let mut idx = RTreeIndex::new(meta(), 4);
    for i in 0..50i64 {
        idx.insert(bbox(i as f64, i as f64), Rid(i as u64)).unwrap();
    }
    assert!(idx.depth() > 1);
    let window = Key::BBox(BoundingBox::new(vec![10.0, 10.0], vec![20.0, 20.0]));
    let mut got: Vec<u64> = idx.search(&window).unwrap().into_iter().map(|r| r.0).collect();
    got.sort_unstable();
    assert_eq!(got, (10..=20).collect::<Vec<_>>());
}

#[test]
fn nearest_returns_k_closest_points() {
    let mut idx = RTreeIndex::new(meta(), 4);
    for (i, (x, y)) in [(0.0, 0.0), (10.0, 10.0), (1.0, 0.0), (0.5, 0.5)].into_iter().enumerate() {
        idx.insert(bbox(x, y), Rid(i as u64)).unwrap();
    }
    let got = idx.nearest(&Point::new(vec![0.0, 0.0]), 2);
    let mut ids: Vec<u64> = got.into_iter().map(|r| r.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 3]);
}

#[test]
fn delete_removes_entry_and_search_stops_finding_it() {
    let mut idx = RTreeIndex::new(meta(), 4);
    idx.insert(bbox(1.0, 1.0), Rid(1)).unwrap();
    idx.insert(bbox(2.0, 2.0), Rid(2)).unwrap();
    idx.delete(&bbox(1.0, 1.0), Rid(1)).unwrap();
    let window = Key::BBox(BoundingBox::new(vec![0.0, 0.0], vec![3.0, 3.0]));
    let got: Vec<u64> = idx.search(&window).unwrap().into_iter().map(|r| r.0).collect();
    assert_eq!(got, vec![2]);
}
