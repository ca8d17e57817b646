//! R*-tree (spec §4.4), grounded on `original_source`'s `rtree.py`. Internal
//! entries carry the union bbox of their subtree; leaves carry `(bbox,
//! rid)`. Splits use the R* margin-minimizing axis followed by the
//! overlap-minimizing split index; `nearest` is a best-first search over
//! bbox-to-point lower bounds (Hjaltason/Samet-style), which is admissible
//! because a box's distance to a point never exceeds the true distance to
//! any point it contains.

use super::{IndexHandle, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::row::Rid;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

enum Node {
    Leaf { entries: Vec<(BoundingBox, Rid)> },
    Internal { entries: Vec<(BoundingBox, Box<Node>)> },
}

impl Node {
    fn len(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { entries } => entries.len(),
        }
    }

    fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Node::Leaf { entries } => BoundingBox::union_all(entries.iter().map(|(b, _)| b)),
            Node::Internal { entries } => BoundingBox::union_all(entries.iter().map(|(b, _)| b)),
        }
    }

    fn entry_count(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { entries } => entries.iter().map(|(_, c)| c.entry_count()).sum(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { entries } => 1 + entries.first().map(|(_, c)| c.depth()).unwrap_or(0),
        }
    }
}

/// Assigns each bbox to split-group `true`/`false` using the R* axis and
/// split-index selection.
fn rstar_split(bboxes: &[BoundingBox], min_entries: usize) -> Vec<bool> {
    let n = bboxes.len();
    let dims = bboxes[0].dims();
    let min_entries = min_entries.max(1).min(n / 2);

    let mut best_axis = 0;
    let mut best_margin = f64::INFINITY;
    for axis in 0..dims {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| bboxes[a].min[axis].partial_cmp(&bboxes[b].min[axis]).unwrap());
        let mut margin_sum = 0.0;
        for k in min_entries..=(n - min_entries) {
            let b1 = BoundingBox::union_all(order[..k].iter().map(|&i| &bboxes[i])).unwrap();
            let b2 = BoundingBox::union_all(order[k..].iter().map(|&i| &bboxes[i])).unwrap();
            margin_sum += b1.margin() + b2.margin();
        }
        if margin_sum < best_margin {
            best_margin = margin_sum;
            best_axis = axis;
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| bboxes[a].min[best_axis].partial_cmp(&bboxes[b].min[best_axis]).unwrap());
    let mut best_k = min_entries;
    let mut best_overlap = f64::INFINITY;
    let mut best_area = f64::INFINITY;
    for k in min_entries..=(n - min_entries) {
        let b1 = BoundingBox::union_all(order[..k].iter().map(|&i| &bboxes[i])).unwrap();
        let b2 = BoundingBox::union_all(order[k..].iter().map(|&i| &bboxes[i])).unwrap();
        let overlap = b1.overlap(&b2);
        let area = b1.area() + b2.area();
        if overlap < best_overlap || (overlap == best_overlap && area < best_area) {
            best_overlap = overlap;
            best_area = area;
            best_k = k;
        }
    }

    let mut assign = vec![false; n];
    for &i in &order[best_k..] {
        assign[i] = true;
    }
    assign
}

fn split_leaf(entries: &mut Vec<(BoundingBox, Rid)>, min_entries: usize) -> (BoundingBox, Box<Node>) {
    let bboxes: Vec<BoundingBox> = entries.iter().map(|(b, _)| b.clone()).collect();
    let assign = rstar_split(&bboxes, min_entries);
    let mut group_a = Vec::new();
    let mut group_b = Vec::new();
    for (i, e) in entries.drain(..).enumerate() {
        if assign[i] {
            group_b.push(e);
        } else {
            group_a.push(e);
        }
    }
    *entries = group_a;
    let bbox_b = BoundingBox::union_all(group_b.iter().map(|(b, _)| b)).unwrap();
    (bbox_b, Box::new(Node::Leaf { entries: group_b }))
}

fn split_internal(entries: &mut Vec<(BoundingBox, Box<Node>)>, min_entries: usize) -> (BoundingBox, Box<Node>) {
    let bboxes: Vec<BoundingBox> = entries.iter().map(|(b, _)| b.clone()).collect();
    let assign = rstar_split(&bboxes, min_entries);
    let mut group_a = Vec::new();
    let mut group_b = Vec::new();
    for (i, e) in entries.drain(..).enumerate() {
        if assign[i] {
            group_b.push(e);
        } else {
            group_a.push(e);
        }
    }
    *entries = group_a;
    let bbox_b = BoundingBox::union_all(group_b.iter().map(|(b, _)| b)).unwrap();
    (bbox_b, Box::new(Node::Internal { entries: group_b }))
}

fn insert_rec(node: &mut Node, bbox: BoundingBox, rid: Rid, max: usize, min: usize) -> Option<(BoundingBox, Box<Node>)> {
    match node {
        Node::Leaf { entries } => {
            entries.push((bbox, rid));
            if entries.len() > max {
                Some(split_leaf(entries, min))
            } else {
                None
            }
        }
        Node::Internal { entries } => {
            let idx = entries
                .iter()
                .enumerate()
                .min_by(|(_, (a, _)), (_, (b, _))| {
                    a.enlargement(&bbox)
                        .partial_cmp(&b.enlargement(&bbox))
                        .unwrap()
                        .then(a.area().partial_cmp(&b.area()).unwrap())
                })
                .map(|(i, _)| i)
                .expect("internal node never has zero entries");

            let split = insert_rec(&mut entries[idx].1, bbox, rid, max, min);
            entries[idx].0 = entries[idx].1.bbox().unwrap_or_else(|| entries[idx].0.clone());

            match split {
                None => None,
                Some((sib_bbox, sib_node)) => {
                    entries.push((sib_bbox, sib_node));
                    if entries.len() > max {
                        Some(split_internal(entries, min))
                    } else {
                        None
                    }
                }
            }
        }
    }
}

fn search_rec(node: &Node, window: &BoundingBox, out: &mut Vec<Rid>) {
    match node {
        Node::Leaf { entries } => {
            for (b, rid) in entries {
                if b.intersects(window) {
                    out.push(*rid);
                }
            }
        }
        Node::Internal { entries } => {
            for (b, child) in entries {
                if b.intersects(window) {
                    search_rec(child, window, out);
                }
            }
        }
    }
}

fn collect_all(node: Node, out: &mut Vec<(BoundingBox, Rid)>) {
    match node {
        Node::Leaf { entries } => out.extend(entries),
        Node::Internal { entries } => {
            for (_, child) in entries {
                collect_all(*child, out);
            }
        }
    }
}

fn delete_rec(node: &mut Node, bbox: &BoundingBox, rid: Rid, min: usize, orphans: &mut Vec<(BoundingBox, Rid)>) -> bool {
    match node {
        Node::Leaf { entries } => {
            if let Some(pos) = entries.iter().position(|(b, r)| b == bbox && *r == rid) {
                entries.remove(pos);
                true
            } else {
                false
            }
        }
        Node::Internal { entries } => {
            let mut found = false;
            let mut remove_idx = None;
            for i in 0..entries.len() {
                if !entries[i].0.intersects(bbox) {
                    continue;
                }
                if delete_rec(&mut entries[i].1, bbox, rid, min, orphans) {
                    found = true;
                    if entries[i].1.len() < min {
                        remove_idx = Some(i);
                    } else {
                        entries[i].0 = entries[i].1.bbox().unwrap_or_else(|| entries[i].0.clone());
                    }
                    break;
                }
            }
            if let Some(i) = remove_idx {
                let (_, child) = entries.remove(i);
                collect_all(*child, orphans);
            }
            found
        }
    }
}

struct Candidate<'a> {
    dist: f64,
    node: Option<&'a Node>,
    rid: Option<Rid>,
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}
impl Eq for Candidate<'_> {}
impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so BinaryHeap (a max-heap) pops the smallest distance first
        other.dist.partial_cmp(&self.dist).unwrap_or(Ordering::Equal)
    }
}

pub struct RTreeIndex {
    meta: IndexMetadata,
    root: Box<Node>,
    max_entries: usize,
    min_entries: usize,
}

impl RTreeIndex {
    pub fn new(meta: IndexMetadata, fanout: usize) -> Self {
        let max_entries = fanout.clamp(4, 50);
        RTreeIndex {
            meta,
            root: Box::new(Node::Leaf { entries: Vec::new() }),
            max_entries,
            min_entries: (max_entries / 2).max(1),
        }
    }

    fn key_to_bbox(key: &Key) -> Result<&BoundingBox> {
        match key {
            Key::BBox(b) => Ok(b),
            _ => Err(Error::unsupported("rtree", "rtree keys must be bounding boxes")),
        }
    }

    fn insert_bbox(&mut self, bbox: BoundingBox, rid: Rid) {
        if let Some((sib_bbox, sib_node)) = insert_rec(&mut self.root, bbox, rid, self.max_entries, self.min_entries) {
            let old_bbox = self.root.bbox().unwrap_or_else(|| sib_bbox.clone());
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::Leaf { entries: Vec::new() }));
            self.root = Box::new(Node::Internal {
                entries: vec![(old_bbox, old_root), (sib_bbox, sib_node)],
            });
        }
    }

    fn collapse_root(&mut self) {
        let should_collapse = matches!(self.root.as_ref(), Node::Internal { entries } if entries.len() == 1);
        if should_collapse {
            let root = std::mem::replace(&mut self.root, Box::new(Node::Leaf { entries: Vec::new() }));
            if let Node::Internal { mut entries } = *root {
                let (_, child) = entries.pop().unwrap();
                self.root = child;
            }
        }
    }

    /// Returns the `k` rids whose bbox is nearest `point` (spec §4.4's
    /// best-first search).
    pub fn nearest(&self, point: &crate::geometry::Point, k: usize) -> Vec<Rid> {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { dist: 0.0, node: Some(&self.root), rid: None });
        let mut results = Vec::new();
        while let Some(candidate) = heap.pop() {
            if results.len() >= k {
                break;
            }
            if let Some(rid) = candidate.rid {
                results.push(rid);
                continue;
            }
            match candidate.node.unwrap() {
                Node::Leaf { entries } => {
                    for (b, rid) in entries {
                        heap.push(Candidate { dist: b.distance_to_point(point), node: None, rid: Some(*rid) });
                    }
                }
                Node::Internal { entries } => {
                    for (b, child) in entries {
                        heap.push(Candidate { dist: b.distance_to_point(point), node: Some(child), rid: None });
                    }
                }
            }
        }
        results
    }
}

impl IndexHandle for RTreeIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        let bbox = Self::key_to_bbox(&key)?.clone();
        self.insert_bbox(bbox, rid);
        Ok(())
    }

    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()> {
        let bbox = Self::key_to_bbox(key)?.clone();
        let mut orphans = Vec::new();
        let found = delete_rec(&mut self.root, &bbox, rid, self.min_entries, &mut orphans);
        if !found {
            return Err(Error::not_found(&self.meta.name));
        }
        for (b, r) in orphans {
            self.insert_bbox(b, r);
        }
        self.collapse_root();
        Ok(())
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        let window = Self::key_to_bbox(key)?;
        let mut out = Vec::new();
        search_rec(&self.root, window, &mut out);
        Ok(out)
    }

    fn rebuild(&mut self) -> Result<()> {
        let mut all = Vec::new();
        let root = std::mem::replace(&mut self.root, Box::new(Node::Leaf { entries: Vec::new() }));
        collect_all(*root, &mut all);
        for (bbox, rid) in all {
            self.insert_bbox(bbox, rid);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.root.entry_count()
    }

    fn size_bytes_estimate(&self) -> usize {
        self.len() * std::mem::size_of::<(BoundingBox, Rid)>()
    }

    fn depth(&self) -> usize {
        self.root.depth()
    }
}

#[cfg(test)]
mod rtree_test;
