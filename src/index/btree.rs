//! Order-`m` B-tree index (spec §4.1), grounded on `original_source`'s
//! `btree.py` for the operation set and on the teacher's `llrb.rs` for
//! Rust-side node/recursion style (even though the teacher's structure is a
//! red-black tree, not a B-tree).
//!
//! The constructor's `order` parameter is the CLRS minimum degree `t`: a
//! node holds at most `2t - 1` keys and (non-root) at least `t - 1`. This
//! is the reading that reproduces spec §8 scenario 1 exactly (`order 4`,
//! sequential insert of `1..=7` yields root `[4]`, children `[1,2,3]` and
//! `[5,6,7]`) — the prose's "`⌈m/2⌉−1` and `m−1` keys" bound holds with
//! `m = 2t`.

use super::{IndexHandle, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::row::Rid;

#[derive(Debug, Clone)]
struct Node {
    keys: Vec<Key>,
    vals: Vec<Vec<Rid>>,
    children: Vec<Box<Node>>,
}

impl Node {
    fn leaf() -> Self {
        Node {
            keys: Vec::new(),
            vals: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Result of a child insertion that overflowed: the key/value promoted to
/// the parent, and the new right sibling.
type SplitResult = Option<(Key, Vec<Rid>, Box<Node>)>;

pub struct BTreeIndex {
    meta: IndexMetadata,
    root: Box<Node>,
    t: usize,
}

impl BTreeIndex {
    pub fn new(meta: IndexMetadata, order: usize) -> Self {
        BTreeIndex {
            meta,
            root: Box::new(Node::leaf()),
            t: order.max(2),
        }
    }

    fn max_keys(&self) -> usize {
        2 * self.t - 1
    }

    fn min_keys(&self) -> usize {
        self.t - 1
    }

    pub fn search_node(&self, key: &Key) -> Option<&Vec<Rid>> {
        Self::search_rec(&self.root, key)
    }

    fn search_rec(node: &Node, key: &Key) -> Option<&Vec<Rid>> {
        match node.keys.binary_search(key) {
            Ok(idx) => Some(&node.vals[idx]),
            Err(idx) => {
                if node.is_leaf() {
                    None
                } else {
                    Self::search_rec(&node.children[idx], key)
                }
            }
        }
    }

    fn insert_rec(node: &mut Node, key: Key, rid: Rid, t: usize) -> SplitResult {
        if node.is_leaf() {
            match node.keys.binary_search(&key) {
                Ok(idx) => {
                    node.vals[idx].push(rid);
                    None
                }
                Err(idx) => {
                    node.keys.insert(idx, key);
                    node.vals.insert(idx, vec![rid]);
                    Self::maybe_split(node, t)
                }
            }
        } else {
            let i = node.keys.partition_point(|k| *k <= key);
            let split = Self::insert_rec(&mut node.children[i], key, rid, t);
            if let Some((median_key, median_val, new_right)) = split {
                node.keys.insert(i, median_key);
                node.vals.insert(i, median_val);
                node.children.insert(i + 1, new_right);
            }
            Self::maybe_split(node, t)
        }
    }

    fn maybe_split(node: &mut Node, t: usize) -> SplitResult {
        let max_keys = 2 * t - 1;
        if node.keys.len() < max_keys {
            return None;
        }
        let median_idx = t - 1;
        let median_key = node.keys[median_idx].clone();
        let median_val = node.vals[median_idx].clone();

        let right_keys = node.keys.split_off(median_idx + 1);
        let right_vals = node.vals.split_off(median_idx + 1);
        node.keys.truncate(median_idx);
        node.vals.truncate(median_idx);

        let right_children = if node.is_leaf() {
            Vec::new()
        } else {
            node.children.split_off(t)
        };

        let new_right = Box::new(Node {
            keys: right_keys,
            vals: right_vals,
            children: right_children,
        });

        Some((median_key, median_val, new_right))
    }

    fn find_vals_mut<'a>(node: &'a mut Node, key: &Key) -> Option<&'a mut Vec<Rid>> {
        match node.keys.binary_search(key) {
            Ok(idx) => Some(&mut node.vals[idx]),
            Err(idx) => {
                if node.is_leaf() {
                    None
                } else {
                    Self::find_vals_mut(&mut node.children[idx], key)
                }
            }
        }
    }

    fn get_max(node: &Node) -> (Key, Vec<Rid>) {
        if node.is_leaf() {
            (
                node.keys.last().unwrap().clone(),
                node.vals.last().unwrap().clone(),
            )
        } else {
            Self::get_max(node.children.last().unwrap())
        }
    }

    fn get_min(node: &Node) -> (Key, Vec<Rid>) {
        if node.is_leaf() {
            (node.keys[0].clone(), node.vals[0].clone())
        } else {
            Self::get_min(&node.children[0])
        }
    }

    fn merge_children(node: &mut Node, idx: usize) {
        let sep_key = node.keys.remove(idx);
        let sep_val = node.vals.remove(idx);
        let right = node.children.remove(idx + 1);
        let left = &mut node.children[idx];
        left.keys.push(sep_key);
        left.vals.push(sep_val);
        left.keys.extend(right.keys.iter().cloned());
        left.vals.extend(right.vals.iter().cloned());
        left.children.extend(right.children.into_iter());
    }

    fn ensure_child_has_min(node: &mut Node, i: usize, t: usize) -> usize {
        if node.children[i].keys.len() >= t {
            return i;
        }
        if i > 0 && node.children[i - 1].keys.len() >= t {
            let sep = node.keys[i - 1].clone();
            let sep_val = node.vals[i - 1].clone();
            node.children[i].keys.insert(0, sep);
            node.children[i].vals.insert(0, sep_val);
            if !node.children[i - 1].is_leaf() {
                let moved = node.children[i - 1].children.pop().unwrap();
                node.children[i].children.insert(0, moved);
            }
            let new_sep = node.children[i - 1].keys.pop().unwrap();
            let new_sep_val = node.children[i - 1].vals.pop().unwrap();
            node.keys[i - 1] = new_sep;
            node.vals[i - 1] = new_sep_val;
            return i;
        }
        if i + 1 < node.children.len() && node.children[i + 1].keys.len() >= t {
            let sep = node.keys[i].clone();
            let sep_val = node.vals[i].clone();
            node.children[i].keys.push(sep);
            node.children[i].vals.push(sep_val);
            if !node.children[i + 1].is_leaf() {
                let moved = node.children[i + 1].children.remove(0);
                node.children[i].children.push(moved);
            }
            let new_sep = node.children[i + 1].keys.remove(0);
            let new_sep_val = node.children[i + 1].vals.remove(0);
            node.keys[i] = new_sep;
            node.vals[i] = new_sep_val;
            return i;
        }
        if i > 0 {
            Self::merge_children(node, i - 1);
            i - 1
        } else {
            Self::merge_children(node, i);
            i
        }
    }

    fn delete_key_rec(node: &mut Node, key: &Key, t: usize) {
        match node.keys.binary_search(key) {
            Ok(idx) => {
                if node.is_leaf() {
                    node.keys.remove(idx);
                    node.vals.remove(idx);
                } else if node.children[idx].keys.len() >= t {
                    let (pred_key, pred_val) = Self::get_max(&node.children[idx]);
                    node.keys[idx] = pred_key.clone();
                    node.vals[idx] = pred_val;
                    Self::delete_key_rec(&mut node.children[idx], &pred_key, t);
                } else if node.children[idx + 1].keys.len() >= t {
                    let (succ_key, succ_val) = Self::get_min(&node.children[idx + 1]);
                    node.keys[idx] = succ_key.clone();
                    node.vals[idx] = succ_val;
                    Self::delete_key_rec(&mut node.children[idx + 1], &succ_key, t);
                } else {
                    Self::merge_children(node, idx);
                    Self::delete_key_rec(&mut node.children[idx], key, t);
                }
            }
            Err(idx) => {
                if node.is_leaf() {
                    return;
                }
                Self::ensure_child_has_min(node, idx, t);
                // A merge/borrow above may have shifted which child now
                // covers `key`; re-resolve the routing index against the
                // node's current keys rather than trusting `idx`.
                let i = node.keys.partition_point(|k| k < key).min(node.children.len() - 1);
                Self::delete_key_rec(&mut node.children[i], key, t);
            }
        }
    }

    fn optimize_rec(node: &mut Node, t: usize, target: usize) {
        if node.is_leaf() {
            return;
        }
        let mut i = 0;
        while i < node.children.len() {
            if node.children[i].keys.len() < target && node.children[i].keys.len() < t {
                let new_i = Self::ensure_child_has_min(node, i, t);
                i = new_i;
            }
            i += 1;
        }
        for child in node.children.iter_mut() {
            Self::optimize_rec(child, t, target);
        }
    }

    /// In-order collection restricted to `[lo, hi]`, pruning subtrees
    /// entirely outside the range.
    fn range_rec(node: &Node, lo: &Key, hi: &Key, out: &mut Vec<Rid>) {
        let mut i = 0;
        while i < node.keys.len() {
            if !node.is_leaf() && &node.keys[i] >= lo {
                Self::range_rec(&node.children[i], lo, hi, out);
            }
            if &node.keys[i] >= lo && &node.keys[i] <= hi {
                out.extend(node.vals[i].iter().cloned());
            }
            if &node.keys[i] > hi {
                return;
            }
            i += 1;
        }
        if !node.is_leaf() {
            Self::range_rec(&node.children[i], lo, hi, out);
        }
    }

    fn depth_rec(node: &Node) -> usize {
        if node.is_leaf() {
            1
        } else {
            1 + Self::depth_rec(&node.children[0])
        }
    }

    #[cfg(test)]
    fn debug_children_keys(&self) -> Vec<Vec<Key>> {
        self.root.children.iter().map(|c| c.keys.clone()).collect()
    }

    #[cfg(test)]
    fn debug_root_keys(&self) -> Vec<Key> {
        self.root.keys.clone()
    }

    #[cfg(test)]
    fn debug_leaf_depths(&self) -> Vec<usize> {
        fn walk(node: &Node, depth: usize, out: &mut Vec<usize>) {
            if node.is_leaf() {
                out.push(depth);
            } else {
                for c in &node.children {
                    walk(c, depth + 1, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, 0, &mut out);
        out
    }
}

impl IndexHandle for BTreeIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        if self.meta.unique {
            if let Some(existing) = self.search_node(&key) {
                if !existing.is_empty() {
                    return Err(Error::uniqueness_violation(
                        &self.meta.name,
                        format!("duplicate key {:?}", key),
                    ));
                }
            }
        }
        let t = self.t;
        if let Some((median_key, median_val, new_right)) = Self::insert_rec(&mut self.root, key, rid, t) {
            let old_root = std::mem::replace(&mut self.root, Box::new(Node::leaf()));
            self.root = Box::new(Node {
                keys: vec![median_key],
                vals: vec![median_val],
                children: vec![old_root, new_right],
            });
        }
        Ok(())
    }

    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()> {
        let t = self.t;
        let vals = match Self::find_vals_mut(&mut self.root, key) {
            Some(v) => v,
            None => return Err(Error::not_found(&self.meta.name)),
        };
        let pos = match vals.iter().position(|r| *r == rid) {
            Some(p) => p,
            None => return Err(Error::not_found(&self.meta.name)),
        };
        vals.remove(pos);
        let now_empty = vals.is_empty();
        if now_empty {
            Self::delete_key_rec(&mut self.root, key, t);
            if !self.root.is_leaf() && self.root.keys.is_empty() {
                self.root = self.root.children.remove(0);
            }
        }
        Ok(())
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        Ok(self.search_node(key).cloned().unwrap_or_default())
    }

    fn range(&self, lo: &Key, hi: &Key) -> Result<Vec<Rid>> {
        let mut out = Vec::new();
        Self::range_rec(&self.root, lo, hi, &mut out);
        Ok(out)
    }

    fn rebuild(&mut self) -> Result<()> {
        // Structural rebuild doesn't change semantics for an in-memory
        // B-tree; re-run the local-rebalance pass so fragmentation from
        // deletes is fully compacted.
        self.optimize();
        Ok(())
    }

    fn len(&self) -> usize {
        fn count(node: &Node) -> usize {
            node.vals.iter().map(|v| v.len()).sum::<usize>()
                + node.children.iter().map(|c| count(c)).sum::<usize>()
        }
        count(&self.root)
    }

    fn size_bytes_estimate(&self) -> usize {
        self.len() * std::mem::size_of::<(Key, Rid)>()
    }

    fn depth(&self) -> usize {
        Self::depth_rec(&self.root)
    }
}

impl BTreeIndex {
    /// Local rebalance pass (spec §4.1 `optimize`): any non-root node
    /// falling below `⌈m/3⌉−1` keys (with `m = 2t`) is borrowed/merged back
    /// toward the structural minimum.
    pub fn optimize(&mut self) {
        let t = self.t;
        let m = 2 * t;
        let target = (m + 2) / 3 - 1; // ceil(m/3) - 1
        Self::optimize_rec(&mut self.root, t, target.max(1));
    }
}

#[cfg(test)]
mod btree_test;
