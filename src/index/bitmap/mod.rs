//! Bitmap index (spec §4.3), grounded on `original_source`'s `bitmap.py`:
//! one bitmap per distinct value of a low-cardinality column, bit `i` set
//! iff row `i` carries that value. Deletes are tombstoned until `rebuild`
//! physically removes them. The dictionary of distinct values is ordered by
//! `Key`'s own `Ord` impl, making the total order that `range` relies on
//! (spec §9's open question on `bitmap.range_search`) explicit rather than
//! incidental to iteration order.

pub mod concise;
pub mod encoding;
pub mod roaring;
pub mod wah;

use super::{IndexHandle, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::row::Rid;
use encoding::{BitSet, Encoding};
use std::collections::{BTreeMap, HashSet};

enum Stored {
    Uncompressed(BitSet),
    Wah(Vec<u32>),
    Concise(Vec<u32>),
    Roaring(croaring::Bitmap),
}

impl Stored {
    fn decode(&self, len: u64) -> BitSet {
        match self {
            Stored::Uncompressed(b) => b.clone(),
            Stored::Wah(words) => wah::decode(words, len),
            Stored::Concise(words) => concise::decode(words, len),
            Stored::Roaring(bm) => roaring::decode(bm),
        }
    }

    fn encode(encoding: Encoding, bits: &BitSet, len: u64) -> Self {
        match encoding {
            Encoding::Uncompressed => Stored::Uncompressed(bits.clone()),
            Encoding::Wah => Stored::Wah(wah::encode(bits, len)),
            Encoding::Concise => Stored::Concise(concise::encode(bits, len)),
            Encoding::Roaring => Stored::Roaring(roaring::encode(bits)),
        }
    }
}

pub struct BitmapIndex {
    meta: IndexMetadata,
    encoding: Encoding,
    row_count: u64,
    /// `None` means no cardinality guard (spec §4.3's guard is optional).
    max_distinct_values: Option<usize>,
    values: BTreeMap<Key, Stored>,
    deleted: HashSet<u64>,
}

impl BitmapIndex {
    pub fn new(meta: IndexMetadata, encoding: Encoding, max_distinct_values: Option<usize>) -> Self {
        BitmapIndex {
            meta,
            encoding,
            row_count: 0,
            max_distinct_values,
            values: BTreeMap::new(),
            deleted: HashSet::new(),
        }
    }

    pub fn distinct_values(&self) -> usize {
        self.values.len()
    }

    fn bump_row_count(&mut self, rid: Rid) {
        if rid.0 + 1 > self.row_count {
            self.row_count = rid.0 + 1;
        }
    }
}

impl IndexHandle for BitmapIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        if !self.values.contains_key(&key) {
            if let Some(max) = self.max_distinct_values {
                if self.values.len() + 1 > max {
                    return Err(Error::cardinality_exceeded(
                        &self.meta.name,
                        "insert exceeds bitmap cardinality",
                    ));
                }
            }
        }
        self.bump_row_count(rid);
        let len = self.row_count;
        let entry = self.values.remove(&key).unwrap_or_else(|| Stored::encode(self.encoding, &BitSet::new(), len));
        let mut bits = entry.decode(len);
        bits.set(rid.0);
        self.values.insert(key, Stored::encode(self.encoding, &bits, len));
        Ok(())
    }

    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()> {
        let len = self.row_count;
        match self.values.remove(key) {
            Some(entry) => {
                let mut bits = entry.decode(len);
                bits.clear(rid.0);
                self.values.insert(key.clone(), Stored::encode(self.encoding, &bits, len));
                self.deleted.insert(rid.0);
                Ok(())
            }
            None => Err(Error::not_found(&self.meta.name)),
        }
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        let len = self.row_count;
        Ok(match self.values.get(key) {
            Some(entry) => entry
                .decode(len)
                .ones()
                .into_iter()
                .filter(|rid| !self.deleted.contains(rid))
                .map(Rid)
                .collect(),
            None => Vec::new(),
        })
    }

    fn range(&self, lo: &Key, hi: &Key) -> Result<Vec<Rid>> {
        let len = self.row_count;
        let mut acc = BitSet::new();
        for (_, entry) in self.values.range(lo.clone()..=hi.clone()) {
            acc = acc.or_with(&entry.decode(len));
        }
        Ok(acc
            .ones()
            .into_iter()
            .filter(|rid| !self.deleted.contains(rid))
            .map(Rid)
            .collect())
    }

    fn rebuild(&mut self) -> Result<()> {
        let len = self.row_count;
        let deleted = std::mem::take(&mut self.deleted);
        let keys: Vec<Key> = self.values.keys().cloned().collect();
        for key in keys {
            let entry = self.values.remove(&key).expect("key just listed");
            let mut bits = entry.decode(len);
            for &rid in &deleted {
                bits.clear(rid);
            }
            self.values.insert(key, Stored::encode(self.encoding, &bits, len));
        }
        Ok(())
    }

    fn len(&self) -> usize {
        let len = self.row_count;
        self.values
            .values()
            .map(|e| e.decode(len).cardinality())
            .sum::<usize>()
            .saturating_sub(self.deleted.len())
    }

    fn size_bytes_estimate(&self) -> usize {
        self.values
            .values()
            .map(|e| match e {
                Stored::Uncompressed(b) => b.words.len() * 8,
                Stored::Wah(w) => w.len() * 4,
                Stored::Concise(w) => w.len() * 4,
                Stored::Roaring(bm) => bm.serialize().len(),
            })
            .sum()
    }

    fn fragmentation_ratio(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.deleted.len() as f64 / self.row_count as f64
        }
    }
}

#[cfg(test)]
mod bitmap_test;
