//! The index family: a tagged `IndexKind` plus a uniform `IndexHandle`
//! capability contract (insert/delete/search/range?/rebuild/stats), per
//! spec §9's "replace inheritance of index types with a tagged variant".
//! Grounded on `original_source`'s `core.py` (`Index`, `IndexMetadata`,
//! lifecycle) and on the teacher's own `Index<K,V,B>` enum shape in
//! `index.rs` (dispatch over a variant rather than a class hierarchy).

pub mod bitmap;
pub mod btree;
pub mod composite;
pub mod gist;
pub mod hash;
pub mod partial;
pub mod rtree;

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::row::{Rid, Scalar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Converts a row's scalar column value into the tagged key type, following
/// `partial.rs`'s `scalar_to_key` mapping (integers and bools/floats
/// truncated to `Key::Int`, strings/null to `Key::Str`).
pub fn key_from_scalar(s: &Scalar) -> Key {
    match s {
        Scalar::Int(i) => Key::Int(*i),
        Scalar::Bool(b) => Key::Int(if *b { 1 } else { 0 }),
        Scalar::Float(f) => Key::Int(*f as i64),
        Scalar::Str(s) => Key::Str(s.clone()),
        Scalar::Null => Key::Str(String::new()),
    }
}

/// Which concrete structure backs an index (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    BTree,
    Hash,
    Bitmap,
    RTree,
    Gist,
    Composite,
    Partial,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IndexKind::BTree => "btree",
            IndexKind::Hash => "hash",
            IndexKind::Bitmap => "bitmap",
            IndexKind::RTree => "rtree",
            IndexKind::Gist => "gist",
            IndexKind::Composite => "composite",
            IndexKind::Partial => "partial",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle of an index entity (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Created,
    Populated,
    Active,
    Maintenance,
    Dropped,
}

/// Opaque kind-specific tuning bag (spec §9: "retain an opaque per-kind
/// properties map only for tuning options the core treats as data").
pub type Properties = HashMap<String, serde_json::Value>;

/// A declared key value. The engine normalizes every index's key type to
/// this tagged union so the manager and optimizer can reason about
/// heterogeneous indexes without generic parameters leaking into their
/// public APIs (spec §3.1's "integer, string, bytes, composite tuple,
/// bounding box, predicate").
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Key>),
    BBox(crate::geometry::BoundingBox),
    Text(String),
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        use Key::*;
        match (self, other) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Str(a), Str(b)) => a.partial_cmp(b),
            (Bytes(a), Bytes(b)) => a.partial_cmp(b),
            (Text(a), Text(b)) => a.partial_cmp(b),
            (Tuple(a), Tuple(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Metadata describing a registered index (spec §3.2), independent of its
/// concrete structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub kind: IndexKind,
    pub unique: bool,
    pub primary: bool,
    pub properties: Properties,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub condition: Option<Condition>,
}

impl IndexMetadata {
    pub fn new(name: impl Into<String>, table: impl Into<String>, columns: Vec<String>, kind: IndexKind) -> Self {
        IndexMetadata {
            name: name.into(),
            table: table.into(),
            columns,
            kind,
            unique: false,
            primary: false,
            properties: Properties::new(),
            state: LifecycleState::Created,
            created_at: Utc::now(),
            condition: None,
        }
    }
}

/// The uniform operational contract every concrete index implements (spec
/// §9). `range` returns `Unsupported` for structures that can't support an
/// ordered scan (hash, and bitmap/rtree/gist in ways noted per-module).
pub trait IndexHandle: Send + Sync {
    fn metadata(&self) -> &IndexMetadata;

    fn insert(&mut self, key: Key, rid: Rid) -> Result<()>;
    fn delete(&mut self, key: &Key, rid: Rid) -> Result<()>;
    fn search(&self, key: &Key) -> Result<Vec<Rid>>;

    /// Inserts with the source row available, so a partial index can gate
    /// on its condition (spec §4.7). Every kind but `PartialIndex` ignores
    /// `row` and behaves exactly like `insert`.
    fn insert_with_row(&mut self, key: Key, rid: Rid, row: &crate::row::Row) -> Result<()> {
        let _ = row;
        self.insert(key, rid)
    }

    fn range(&self, _lo: &Key, _hi: &Key) -> Result<Vec<Rid>> {
        Err(Error::unsupported(&self.metadata().name, "range is not supported by this index kind"))
    }

    fn rebuild(&mut self) -> Result<()>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rough in-memory size estimate for `stats.size.size_bytes` (§3.4).
    fn size_bytes_estimate(&self) -> usize;

    /// Structural depth where meaningful (B-tree, R-tree, GiST); 0 otherwise.
    fn depth(&self) -> usize {
        0
    }

    /// Fraction of logical index space occupied by tombstones or
    /// under-filled nodes (spec §3.4, GLOSSARY). `0.0` unless a concrete
    /// index kind tracks tombstones (currently only bitmap).
    fn fragmentation_ratio(&self) -> f64 {
        0.0
    }

    /// Condition statistics (spec §3.4), populated only by `PartialIndex`.
    fn condition_snapshot(&self) -> Option<ConditionSnapshot> {
        None
    }
}

/// Snapshot of a partial index's condition bookkeeping, surfaced through
/// `IndexHandle::condition_snapshot` so the manager can fold it into
/// `stats::IndexConditionStats` without downcasting the trait object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSnapshot {
    pub condition_string: String,
    pub selectivity: f64,
    pub false_positive_rate: f64,
    pub evaluation_time_ms: f64,
}

#[cfg(test)]
mod index_test;
