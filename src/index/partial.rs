//! Partial index (spec §4.7), grounded on `original_source`'s `partial.py`:
//! wraps a base index with a `Condition`, routing every mutation through
//! the condition first and tracking selectivity/false-positive metadata.

use super::{ConditionSnapshot, IndexHandle, IndexMetadata, Key};
use crate::condition::Condition;
use crate::error::Result;
use crate::row::{Row, RowSource, Scalar};
use std::time::Instant;

fn scalar_to_key(s: &Scalar) -> Key {
    match s {
        Scalar::Int(i) => Key::Int(*i),
        Scalar::Bool(b) => Key::Int(if *b { 1 } else { 0 }),
        Scalar::Float(f) => Key::Int(*f as i64),
        Scalar::Str(s) => Key::Str(s.clone()),
        Scalar::Null => Key::Str(String::new()),
    }
}

pub struct PartialIndex {
    meta: IndexMetadata,
    inner: Box<dyn IndexHandle>,
    condition: Condition,
    included_count: u64,
    excluded_count: u64,
    eval_time_ms_avg: f64,
    fp_checks: u64,
    fp_count: u64,
}

impl PartialIndex {
    pub fn new(mut meta: IndexMetadata, inner: Box<dyn IndexHandle>, condition: Condition) -> Self {
        meta.condition = Some(condition.clone());
        PartialIndex {
            meta,
            inner,
            condition,
            included_count: 0,
            excluded_count: 0,
            eval_time_ms_avg: 0.0,
            fp_checks: 0,
            fp_count: 0,
        }
    }

    fn record_eval_time(&mut self, elapsed_ms: f64) {
        let n = (self.included_count + self.excluded_count).max(1) as f64;
        self.eval_time_ms_avg += (elapsed_ms - self.eval_time_ms_avg) / n;
    }

    /// `insert(k, v, row)` from spec §4.7: evaluates the condition before
    /// delegating to the base index.
    pub fn insert_with_row(&mut self, key: Key, rid: crate::row::Rid, row: &Row) -> Result<()> {
        let t0 = Instant::now();
        let matches = self.condition.evaluate(row);
        self.record_eval_time(t0.elapsed().as_secs_f64() * 1000.0);
        if matches {
            self.included_count += 1;
            self.inner.insert(key, rid)
        } else {
            self.excluded_count += 1;
            Ok(())
        }
    }

    /// `search(query, row?)` from spec §4.7. When `row` is supplied and the
    /// condition rejects it, returns empty without consulting the base
    /// index; otherwise delegates and folds the outcome into the running
    /// false-positive-rate estimate.
    pub fn search_with_row(&mut self, query: &Key, row: Option<&Row>) -> Result<Vec<crate::row::Rid>> {
        match row {
            None => self.inner.search(query),
            Some(row) => {
                let t0 = Instant::now();
                let matches = self.condition.evaluate(row);
                self.record_eval_time(t0.elapsed().as_secs_f64() * 1000.0);
                if !matches {
                    return Ok(Vec::new());
                }
                self.fp_checks += 1;
                let result = self.inner.search(query)?;
                if result.is_empty() {
                    self.fp_count += 1;
                }
                Ok(result)
            }
        }
    }

    /// Rebuilds by re-evaluating the condition over a fresh row snapshot
    /// (spec §4.7 `reindex`). Assumes the base index this `PartialIndex`
    /// wraps starts empty — the manager is expected to hand a freshly
    /// created inner index to a reindex pass rather than reuse a live one.
    pub fn reindex(&mut self, source: &dyn RowSource) -> Result<()> {
        self.included_count = 0;
        self.excluded_count = 0;
        self.fp_checks = 0;
        self.fp_count = 0;
        for row in source.iterate() {
            let key = if self.meta.columns.len() == 1 {
                row.get(&self.meta.columns[0]).map(scalar_to_key).unwrap_or(Key::Str(String::new()))
            } else {
                Key::Tuple(
                    self.meta
                        .columns
                        .iter()
                        .map(|c| row.get(c).map(scalar_to_key).unwrap_or(Key::Str(String::new())))
                        .collect(),
                )
            };
            let rid = row.rid;
            self.insert_with_row(key, rid, &row)?;
        }
        Ok(())
    }

    pub fn selectivity(&self) -> f64 {
        let total = self.included_count + self.excluded_count;
        if total == 0 {
            0.0
        } else {
            self.included_count as f64 / total as f64
        }
    }

    pub fn false_positive_rate(&self) -> f64 {
        if self.fp_checks == 0 {
            0.0
        } else {
            self.fp_count as f64 / self.fp_checks as f64
        }
    }

    pub fn evaluation_time_ms(&self) -> f64 {
        self.eval_time_ms_avg
    }

    pub fn included_count(&self) -> u64 {
        self.included_count
    }

    pub fn excluded_count(&self) -> u64 {
        self.excluded_count
    }
}

impl IndexHandle for PartialIndex {
    fn metadata(&self) -> &IndexMetadata {
        &self.meta
    }

    /// Without row context there is nothing to evaluate the condition
    /// against, so a plain `insert` is treated as already-qualified (the
    /// manager is expected to call `insert_with_row` whenever it has one).
    fn insert(&mut self, key: Key, rid: crate::row::Rid) -> Result<()> {
        self.included_count += 1;
        self.inner.insert(key, rid)
    }

    fn delete(&mut self, key: &Key, rid: crate::row::Rid) -> Result<()> {
        self.inner.delete(key, rid)
    }

    fn insert_with_row(&mut self, key: Key, rid: crate::row::Rid, row: &Row) -> Result<()> {
        PartialIndex::insert_with_row(self, key, rid, row)
    }

    fn search(&self, key: &Key) -> Result<Vec<crate::row::Rid>> {
        self.inner.search(key)
    }

    fn range(&self, lo: &Key, hi: &Key) -> Result<Vec<crate::row::Rid>> {
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

    fn condition_snapshot(&self) -> Option<ConditionSnapshot> {
        Some(ConditionSnapshot {
            condition_string: self.condition.canonical_string(),
            selectivity: self.selectivity(),
            false_positive_rate: self.false_positive_rate(),
            evaluation_time_ms: self.evaluation_time_ms(),
        })
    }
}

#[cfg(test)]
mod partial_test;
