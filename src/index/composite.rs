//! Composite index (spec §4.6), grounded on `original_source`'s
//! `composite.py`: a thin wrapper delegating every operation to an inner
//! index over `Key::Tuple` keys, whose lexicographic `Ord` impl already
//! gives tuples structural equality and ordering for free.

use super::{IndexHandle, IndexKind, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::row::Rid;

pub struct CompositeIndex {
    meta: IndexMetadata,
    inner: Box<dyn IndexHandle>,
    arity: usize,
}

impl CompositeIndex {
    pub fn new(meta: IndexMetadata, inner: Box<dyn IndexHandle>) -> Self {
        let arity = meta.columns.len().max(1);
        CompositeIndex { meta, inner, arity }
    }

    pub fn inner_kind(&self) -> IndexKind {
        self.inner.metadata().kind
    }

    /// Prefix search, supported only when the inner index is a B-tree (spec
    /// §4.6). Pads the prefix to the full tuple arity with `Key::Int::MIN`/
    /// `MAX` placeholders and runs an inner range scan: where a trailing
    /// column really is an integer, the placeholder bounds it tightly;
    /// where it's a different variant, `Key`'s cross-variant `Ord` treats
    /// the placeholder as equal to any value there, which still keeps the
    /// match inclusive of every trailing value, exactly what a prefix
    /// search wants.
    pub fn search_prefix(&self, prefix: &[Key]) -> Result<Vec<Rid>> {
        if self.inner_kind() != IndexKind::BTree {
            return Err(Error::unsupported(&self.meta.name, "prefix search requires a B-tree inner index"));
        }
        if prefix.len() > self.arity {
            return Err(Error::unsupported(&self.meta.name, "prefix longer than the composite key's arity"));
        }
        let pad = self.arity - prefix.len();
        let mut lo: Vec<Key> = prefix.to_vec();
        let mut hi: Vec<Key> = prefix.to_vec();
        lo.extend(std::iter::repeat(Key::Int(i64::MIN)).take(pad));
        hi.extend(std::iter::repeat(Key::Int(i64::MAX)).take(pad));
        self.inner.range(&Key::Tuple(lo), &Key::Tuple(hi))
    }
}

impl IndexHandle for CompositeIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        self.inner.insert(key, rid)
    }

    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()> {
        self.inner.delete(key, rid)
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        self.inner.search(key)
    }

    fn range(&self, lo: &Key, hi: &Key) -> Result<Vec<Rid>> {
        if self.inner_kind() != IndexKind::BTree {
            return Err(Error::unsupported(&self.meta.name, "range requires a B-tree inner index"));
        }
        self.inner.range(lo, hi)
    }

    fn rebuild(&mut self) -> Result<()> {
        self.inner.rebuild()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn size_bytes_estimate(&self) -> usize {
        self.inner.size_bytes_estimate()
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }
}

#[cfg(test)]
mod composite_test;
