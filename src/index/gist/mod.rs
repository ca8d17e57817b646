//! Generic GiST framework (spec §4.5), grounded on `original_source`'s
//! `gist.py`: a balanced tree parameterized by a `PredicateStrategy`
//! supplying the five required operations, replacing the source's
//! class-hierarchy-per-predicate-type design with one generic tree plus
//! values implementing a small trait (spec §9).

pub mod regex_strategy;
pub mod trigram;

use super::{IndexHandle, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::row::Rid;

/// The five operations the GiST tree needs from a predicate type (spec
/// §4.5). `consistent` must never have false negatives: if a query could
/// match something under `entry`, it must return `true`.
pub trait PredicateStrategy: Send + Sync {
    type Predicate: Clone;

    fn consistent(&self, entry: &Self::Predicate, query: &Self::Predicate) -> bool;
    fn union(&self, entries: &[Self::Predicate]) -> Self::Predicate;
    fn compress(&self, entry: &Self::Predicate) -> Self::Predicate;
    fn decompress(&self, entry: &Self::Predicate) -> Self::Predicate {
        entry.clone()
    }
    fn penalty(&self, a: &Self::Predicate, b: &Self::Predicate) -> f64;
    fn pick_split(&self, entries: &[Self::Predicate]) -> (Vec<usize>, Vec<usize>);

    /// Builds a predicate from a stored column value.
    fn predicate_for_key(&self, key: &Key) -> Result<Self::Predicate>;
    /// Builds the predicate a query is evaluated against; may differ from
    /// `predicate_for_key` (e.g. a regex pattern vs. a literal value).
    fn query_predicate(&self, key: &Key) -> Result<Self::Predicate> {
        self.predicate_for_key(key)
    }
}

/// The two-seed split scheme shared by the trigram and regex strategies
/// (spec §4.5): pick the pair with the highest pairwise penalty as seeds,
/// then assign every remaining entry to whichever seed it is cheaper to
/// insert under.
pub fn two_seed_split<P>(entries: &[P], penalty: impl Fn(&P, &P) -> f64) -> (Vec<usize>, Vec<usize>) {
    let n = entries.len();
    let mut seed_a = 0;
    let mut seed_b = 1.min(n.saturating_sub(1));
    let mut worst = f64::NEG_INFINITY;
    for i in 0..n {
        for j in (i + 1)..n {
            let p = penalty(&entries[i], &entries[j]);
            if p > worst {
                worst = p;
                seed_a = i;
                seed_b = j;
            }
        }
    }
    let mut group_a = vec![seed_a];
    let mut group_b = vec![seed_b];
    for i in 0..n {
        if i == seed_a || i == seed_b {
            continue;
        }
        let pa = penalty(&entries[seed_a], &entries[i]);
        let pb = penalty(&entries[seed_b], &entries[i]);
        if pa <= pb {
            group_a.push(i);
        } else {
            group_b.push(i);
        }
    }
    (group_a, group_b)
}

enum Node<P> {
    Leaf { entries: Vec<(P, Rid)> },
    Internal { entries: Vec<(P, Box<Node<P>>)> },
}

impl<P: Clone> Node<P> {
    fn len(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { entries } => entries.len(),
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

pub struct GistIndex<S: PredicateStrategy> {
    meta: IndexMetadata,
    strategy: S,
    root: Box<Node<S::Predicate>>,
    max_entries: usize,
    min_entries: usize,
}

impl<S: PredicateStrategy> GistIndex<S> {
    pub fn new(meta: IndexMetadata, strategy: S, fanout: usize) -> Self {
        let max_entries = fanout.clamp(4, 50);
        GistIndex {
            meta,
            strategy,
            root: Box::new(Node::Leaf { entries: Vec::new() }),
            max_entries,
            min_entries: (max_entries / 2).max(1),
        }
    }

    fn insert_rec(&self, node: &mut Node<S::Predicate>, pred: S::Predicate, rid: Rid) -> Option<(S::Predicate, Box<Node<S::Predicate>>)> {
        match node {
            Node::Leaf { entries } => {
                entries.push((pred, rid));
                if entries.len() > self.max_entries {
                    Some(self.split_leaf(entries))
                } else {
                    None
                }
            }
            Node::Internal { entries } => {
                let idx = entries
                    .iter()
                    .enumerate()
                    .min_by(|(_, (a, _)), (_, (b, _))| {
                        self.strategy
                            .penalty(a, &pred)
                            .partial_cmp(&self.strategy.penalty(b, &pred))
                            .unwrap()
                    })
                    .map(|(i, _)| i)
                    .expect("internal node never has zero entries");

                let split = self.insert_rec(&mut entries[idx].1, pred, rid);
                entries[idx].0 = self.strategy.union(&Self::collect_preds(&entries[idx].1));

                match split {
                    None => None,
                    Some((sib_pred, sib_node)) => {
                        entries.push((sib_pred, sib_node));
                        if entries.len() > self.max_entries {
                            Some(self.split_internal(entries))
                        } else {
                            None
                        }
                    }
                }
            }
        }
    }

    fn collect_preds(node: &Node<S::Predicate>) -> Vec<S::Predicate> {
        match node {
            Node::Leaf { entries } => entries.iter().map(|(p, _)| p.clone()).collect(),
            Node::Internal { entries } => entries.iter().map(|(p, _)| p.clone()).collect(),
        }
    }

    fn split_leaf(&self, entries: &mut Vec<(S::Predicate, Rid)>) -> (S::Predicate, Box<Node<S::Predicate>>) {
        let preds: Vec<S::Predicate> = entries.iter().map(|(p, _)| p.clone()).collect();
        let (group_a, group_b) = self.strategy.pick_split(&preds);
        let taken = std::mem::take(entries);
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (i, e) in taken.into_iter().enumerate() {
            if group_b.contains(&i) {
                b.push(e);
            } else if group_a.contains(&i) {
                a.push(e);
            } else {
                a.push(e);
            }
        }
        *entries = a;
        let pred_b = self.strategy.union(&b.iter().map(|(p, _)| p.clone()).collect::<Vec<_>>());
        (pred_b, Box::new(Node::Leaf { entries: b }))
    }

    fn split_internal(&self, entries: &mut Vec<(S::Predicate, Box<Node<S::Predicate>>)>) -> (S::Predicate, Box<Node<S::Predicate>>) {
        let preds: Vec<S::Predicate> = entries.iter().map(|(p, _)| p.clone()).collect();
        let (group_a, group_b) = self.strategy.pick_split(&preds);
        let taken = std::mem::take(entries);
        let mut a = Vec::new();
        let mut b = Vec::new();
        for (i, e) in taken.into_iter().enumerate() {
            if group_b.contains(&i) {
                b.push(e);
            } else {
                a.push(e);
            }
        }
        *entries = a;
        let pred_b = self.strategy.union(&b.iter().map(|(p, _)| p.clone()).collect::<Vec<_>>());
        (pred_b, Box::new(Node::Internal { entries: b }))
    }

    fn search_rec(&self, node: &Node<S::Predicate>, query: &S::Predicate, out: &mut Vec<Rid>) {
        match node {
            Node::Leaf { entries } => {
                for (p, rid) in entries {
                    if self.strategy.consistent(p, query) {
                        out.push(*rid);
                    }
                }
            }
            Node::Internal { entries } => {
                for (p, child) in entries {
                    if self.strategy.consistent(p, query) {
                        self.search_rec(child, query, out);
                    }
                }
            }
        }
    }

    fn collect_all(node: Node<S::Predicate>, out: &mut Vec<(S::Predicate, Rid)>) {
        match node {
            Node::Leaf { entries } => out.extend(entries),
            Node::Internal { entries } => {
                for (_, child) in entries {
                    Self::collect_all(*child, out);
                }
            }
        }
    }

    fn delete_rec(&self, node: &mut Node<S::Predicate>, rid: Rid, orphans: &mut Vec<(S::Predicate, Rid)>) -> bool {
        match node {
            Node::Leaf { entries } => {
                if let Some(pos) = entries.iter().position(|(_, r)| *r == rid) {
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
                    if self.delete_rec(&mut entries[i].1, rid, orphans) {
                        found = true;
                        if entries[i].1.len() < self.min_entries {
                            remove_idx = Some(i);
                        } else {
                            entries[i].0 = self.strategy.union(&Self::collect_preds(&entries[i].1));
                        }
                        break;
                    }
                }
                if let Some(i) = remove_idx {
                    let (_, child) = entries.remove(i);
                    Self::collect_all(*child, orphans);
                }
                found
            }
        }
    }

    fn insert_pred(&mut self, pred: S::Predicate, rid: Rid) {
        if let Some((sib_pred, sib_node)) = self.insert_rec(&mut self.root, pred, rid) {
            let old_pred = self.strategy.union(&Self::collect_preds(&self.root));
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::Leaf { entries: Vec::new() }));
            self.root = Box::new(Node::Internal {
                entries: vec![(old_pred, old_root), (sib_pred, sib_node)],
            });
        }
    }
}

impl<S: PredicateStrategy> IndexHandle for GistIndex<S> {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        let pred = self.strategy.predicate_for_key(&key)?;
        self.insert_pred(pred, rid);
        Ok(())
    }

    fn delete(&mut self, _key: &Key, rid: Rid) -> Result<()> {
        let mut orphans = Vec::new();
        let found = self.delete_rec(&mut self.root, rid, &mut orphans);
        if !found {
            return Err(Error::not_found(&self.meta.name));
        }
        for (p, r) in orphans {
            self.insert_pred(p, r);
        }
        Ok(())
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        let query = self.strategy.query_predicate(key)?;
        let mut out = Vec::new();
        self.search_rec(&self.root, &query, &mut out);
        Ok(out)
    }

    fn rebuild(&mut self) -> Result<()> {
        let mut all = Vec::new();
        let root = std::mem::replace(&mut self.root, Box::new(Node::Leaf { entries: Vec::new() }));
        Self::collect_all(*root, &mut all);
        for (pred, rid) in all {
            self.insert_pred(pred, rid);
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.root.entry_count()
    }

    fn size_bytes_estimate(&self) -> usize {
        self.len() * 64
    }

    fn depth(&self) -> usize {
        self.root.depth()
    }
}
