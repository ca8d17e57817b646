//! Hash index: open hashing with per-bucket collision chains (spec §4.2),
//! grounded on `original_source`'s `hash.py`.

use super::{IndexHandle, IndexMetadata, Key};
use crate::error::{Error, Result};
use crate::row::Rid;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
struct Entry {
    key: Key,
    rid: Rid,
}

pub struct HashIndex {
    meta: IndexMetadata,
    buckets: Vec<Vec<Entry>>,
    entry_count: usize,
    collisions: u64,
    max_chain_len: usize,
}

impl HashIndex {
    pub fn new(meta: IndexMetadata, bucket_count: usize) -> Self {
        HashIndex {
            meta,
            buckets: vec![Vec::new(); bucket_count.max(1)],
            entry_count: 0,
            collisions: 0,
            max_chain_len: 0,
        }
    }

    fn bucket_index(&self, key: &Key) -> usize {
        let mut hasher = DefaultHasher::new();
        hash_key(key, &mut hasher);
        (hasher.finish() as usize) % self.buckets.len()
    }

    pub fn collision_rate(&self) -> f64 {
        if self.entry_count == 0 {
            0.0
        } else {
            self.collisions as f64 / self.entry_count as f64
        }
    }

    pub fn max_chain_length(&self) -> usize {
        self.max_chain_len
    }
}

fn hash_key<H: Hasher>(key: &Key, hasher: &mut H) {
    match key {
        Key::Int(i) => i.hash(hasher),
        Key::Str(s) | Key::Text(s) => s.hash(hasher),
        Key::Bytes(b) => b.hash(hasher),
        Key::Tuple(t) => {
            for k in t {
                hash_key(k, hasher);
            }
        }
        Key::BBox(b) => {
            for v in b.min.iter().chain(b.max.iter()) {
                v.to_bits().hash(hasher);
            }
        }
    }
}

impl IndexHandle for HashIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()> {
        let idx = self.bucket_index(&key);
        let chain = &mut self.buckets[idx];
        if self.meta.unique && chain.iter().any(|e| e.key == key) {
            return Err(Error::uniqueness_violation(
                &self.meta.name,
                format!("duplicate key {:?}", key),
            ));
        }
        // (key, rid) pairs are unique within a chain — spec §9's resolution
        // of the HashIndex.delete row_id-uniqueness open question.
        if !chain.iter().any(|e| e.key == key && e.rid == rid) {
            if !chain.is_empty() {
                self.collisions += 1;
            }
            chain.push(Entry { key, rid });
            self.entry_count += 1;
            self.max_chain_len = self.max_chain_len.max(chain.len());
        }
        Ok(())
    }

    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()> {
        let idx = self.bucket_index(key);
        let chain = &mut self.buckets[idx];
        let pos = chain.iter().position(|e| &e.key == key && e.rid == rid);
        match pos {
            Some(p) => {
                chain.remove(p);
                self.entry_count -= 1;
                Ok(())
            }
            None => Err(Error::not_found(&self.meta.name)),
        }
    }

    fn search(&self, key: &Key) -> Result<Vec<Rid>> {
        let idx = self.bucket_index(key);
        Ok(self.buckets[idx]
            .iter()
            .filter(|e| &e.key == key)
            .map(|e| e.rid)
            .collect())
    }

    fn range(&self, _lo: &Key, _hi: &Key) -> Result<Vec<Rid>> {
        Err(Error::unsupported(&self.meta.name, "hash index does not support range"))
    }

    fn rebuild(&mut self) -> Result<()> {
        // Compacts chains and drops empty buckets (spec §4.2 `rebuild`).
        let bucket_count = self.buckets.len().max(1);
        let mut all: Vec<Entry> = self.buckets.drain(..).flatten().collect();
        self.buckets = vec![Vec::new(); bucket_count];
        self.collisions = 0;
        self.max_chain_len = 0;
        for e in all.drain(..) {
            let idx = self.bucket_index(&e.key);
            if !self.buckets[idx].is_empty() {
                self.collisions += 1;
            }
            self.buckets[idx].push(e);
            self.max_chain_len = self.max_chain_len.max(self.buckets[idx].len());
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entry_count
    }

    fn size_bytes_estimate(&self) -> usize {
        self.entry_count * std::mem::size_of::<(Key, Rid)>()
    }
}

#[cfg(test)]
mod hash_test;
