//! Index advisor (spec §6.1's `analyze_index_usage`/`optimize_indexes`),
//! grounded on `original_source`'s `advisor.py`: tracks query access
//! patterns and per-column cardinality statistics, then recommends which
//! indexes would cover the patterns existing indexes don't.

use crate::index::{IndexKind, IndexMetadata};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryPattern {
    pub table_name: String,
    pub columns: Vec<String>,
    pub is_equality: bool,
    pub is_range: bool,
}

impl QueryPattern {
    pub fn new(table_name: impl Into<String>, columns: Vec<String>, is_equality: bool, is_range: bool) -> Self {
        QueryPattern {
            table_name: table_name.into(),
            columns,
            is_equality,
            is_range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub distinct_values: u64,
    pub null_count: u64,
    pub total_rows: u64,
}

impl ColumnStats {
    pub fn cardinality(&self) -> f64 {
        if self.total_rows == 0 {
            1.0
        } else {
            self.distinct_values as f64 / self.total_rows as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecommendation {
    pub columns: Vec<String>,
    pub kind: IndexKind,
    pub use_bitmap_compression: bool,
}

#[derive(Default)]
pub struct IndexAdvisor {
    query_patterns: HashMap<String, Vec<(QueryPattern, u64)>>,
    column_stats: HashMap<(String, String), ColumnStats>,
    existing_indexes: HashMap<String, Vec<IndexMetadata>>,
}

impl IndexAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or bumps the frequency of) an observed query pattern.
    pub fn record_query_pattern(&mut self, pattern: QueryPattern) {
        let bucket = self.query_patterns.entry(pattern.table_name.clone()).or_default();
        if let Some(existing) = bucket.iter_mut().find(|(p, _)| *p == pattern) {
            existing.1 += 1;
        } else {
            bucket.push((pattern, 1));
        }
    }

    pub fn record_column_stats(&mut self, table_name: impl Into<String>, column_name: impl Into<String>, stats: ColumnStats) {
        self.column_stats.insert((table_name.into(), column_name.into()), stats);
    }

    pub fn register_existing_index(&mut self, meta: IndexMetadata) {
        self.existing_indexes.entry(meta.table.clone()).or_default().push(meta);
    }

    fn covers_pattern(meta: &IndexMetadata, pattern: &QueryPattern) -> bool {
        if meta.columns.len() < pattern.columns.len() {
            return false;
        }
        let prefix_matches = meta.columns.iter().zip(pattern.columns.iter()).all(|(a, b)| a == b);
        if meta.kind == IndexKind::Composite || meta.columns.len() > pattern.columns.len() {
            return prefix_matches;
        }
        prefix_matches && (!pattern.is_range || meta.kind == IndexKind::BTree)
    }

    fn is_pattern_covered(&self, table_name: &str, pattern: &QueryPattern) -> bool {
        self.existing_indexes.get(table_name).map(|idxs| idxs.iter().any(|m| Self::covers_pattern(m, pattern))).unwrap_or(false)
    }

    fn select_index_kind(&self, pattern: &QueryPattern) -> Option<IndexKind> {
        let first_col = pattern.columns.first()?;
        let stats = self.column_stats.get(&(pattern.table_name.clone(), first_col.clone()));
        let stats = match stats {
            Some(s) => s,
            None => return Some(IndexKind::BTree),
        };
        if pattern.is_range {
            return Some(IndexKind::BTree);
        }
        if stats.cardinality() < 0.01 {
            Some(IndexKind::Bitmap)
        } else if pattern.is_equality {
            Some(IndexKind::Hash)
        } else {
            Some(IndexKind::BTree)
        }
    }

    fn should_use_compression(&self, table_name: &str, column_name: &str) -> bool {
        self.column_stats
            .get(&(table_name.to_string(), column_name.to_string()))
            .map(|s| s.cardinality() < 0.001 && s.total_rows > 100_000)
            .unwrap_or(false)
    }

    /// Recommends up to `max_indexes` new indexes for `table_name`, most
    /// frequent uncovered pattern first (spec §6.1, `advisor.py`'s
    /// `recommend_indexes`).
    pub fn recommend_indexes(&self, table_name: &str, max_indexes: usize) -> Vec<IndexRecommendation> {
        let patterns = match self.query_patterns.get(table_name) {
            Some(p) => p,
            None => return Vec::new(),
        };
        let mut sorted: Vec<&(QueryPattern, u64)> = patterns.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        let mut recommendations = Vec::new();
        for (pattern, _freq) in sorted {
            if recommendations.len() >= max_indexes {
                break;
            }
            if self.is_pattern_covered(table_name, pattern) {
                continue;
            }
            if let Some(kind) = self.select_index_kind(pattern) {
                let compress = kind == IndexKind::Bitmap && pattern.columns.first().map(|c| self.should_use_compression(table_name, c)).unwrap_or(false);
                recommendations.push(IndexRecommendation {
                    columns: pattern.columns.clone(),
                    kind,
                    use_bitmap_compression: compress,
                });
            }
        }
        recommendations
    }

    /// Text recommendations across every table with observed patterns
    /// (spec §6.1's `analyze_index_usage`, `advisor.py`'s
    /// `analyze_workload`).
    pub fn analyze_workload(&self) -> HashMap<String, Vec<String>> {
        let mut out = HashMap::new();
        for table in self.query_patterns.keys() {
            let recs = self.recommend_indexes(table, 5);
            if recs.is_empty() {
                continue;
            }
            let lines = recs
                .iter()
                .map(|r| {
                    let base = format!("create {:?} index on ({})", r.kind, r.columns.join(", "));
                    if r.use_bitmap_compression {
                        format!("{base} with compression")
                    } else {
                        base
                    }
                })
                .collect();
            out.insert(table.clone(), lines);
        }
        out
    }
}

#[cfg(test)]
mod advisor_test;
