//! Row identifiers and the row-source collaborator interface (spec §3.1,
//! §6.2).

use std::collections::HashMap;
use std::fmt;

/// Opaque, unique identifier for a base-table row, stable for the row's
/// lifetime (spec §3.1, GLOSSARY). Bitmap and R-tree indexes address rows
/// by position, so this crate normalizes `Rid` to an integer rather than
/// the spec's `integer or byte string` union — callers that key rows by
/// byte string are expected to maintain their own string→`Rid` mapping at
/// the table layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rid(pub u64);

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Rid {
    fn from(v: u64) -> Self {
        Rid(v)
    }
}

/// A scalar column value, used both as an index key component and as a
/// binding in condition evaluation (§3.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        use Scalar::*;
        match (self, other) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Str(a), Str(b)) => a.partial_cmp(b),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// A single base-table row as seen by the condition evaluator and by
/// partial/composite index rebuilds: an ordered column→value dictionary,
/// plus the row's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub rid: Rid,
    pub columns: HashMap<String, Scalar>,
}

impl Row {
    pub fn new(rid: Rid) -> Self {
        Row {
            rid,
            columns: HashMap::new(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: Scalar) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }
}

/// Required to rebuild a partial index from a fresh snapshot (spec §6.2,
/// §4.7 `reindex`).
pub trait RowSource {
    /// Iterates every live row of the underlying table as `(key columns
    /// already projected by the caller, value, full row)` triples, in an
    /// implementation-defined but stable order for the duration of one
    /// rebuild pass.
    fn iterate(&self) -> Box<dyn Iterator<Item = Row> + '_>;
}

/// A `RowSource` backed by an in-memory `Vec`, used by tests and by small
/// embedders that don't have a real table layer.
pub struct VecRowSource {
    rows: Vec<Row>,
}

impl VecRowSource {
    pub fn new(rows: Vec<Row>) -> Self {
        VecRowSource { rows }
    }
}

impl RowSource for VecRowSource {
    fn iterate(&self) -> Box<dyn Iterator<Item = Row> + '_> {
        Box::new(self.rows.iter().cloned())
    }
}

#[cfg(test)]
mod row_test;
