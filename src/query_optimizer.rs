//! Index-aware query optimizer (spec §4.11), grounded on `original_source`'s
//! `query/optimizer/index_aware.py` (`IndexAwareOptimizer`): for a logical
//! query, enumerate the access paths a table's registered indexes offer,
//! cost each from the manager's statistics, and pick the cheapest. Unlike
//! `index_aware.py` this never touches a parsed query plan tree — it only
//! returns the chosen `AccessPath` plus whatever side effect recording the
//! decision has on usage stats, leaving plan rewriting to the caller.

use crate::advisor::QueryPattern;
use crate::condition::{Condition, Operator};
use crate::index::{IndexKind, IndexMetadata};
use crate::manager::IndexManager;

/// `(table, [predicate], [order_by])` from spec §4.11.
#[derive(Debug, Clone)]
pub struct LogicalQuery {
    pub table: String,
    pub predicates: Vec<Condition>,
    pub order_by: Option<String>,
}

impl LogicalQuery {
    pub fn new(table: impl Into<String>, predicates: Vec<Condition>, order_by: Option<String>) -> Self {
        LogicalQuery {
            table: table.into(),
            predicates,
            order_by,
        }
    }
}

/// One candidate way to answer a `LogicalQuery` using a single index.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPath {
    pub index_name: String,
    pub kind: IndexKind,
    pub columns_covered: Vec<String>,
    pub is_range_scan: bool,
    pub supports_ordering: bool,
    pub cost: f64,
}

fn condition_columns(c: &Condition) -> Vec<String> {
    match c {
        Condition::Simple { column, .. } => vec![column.clone()],
        Condition::Composite { children, .. } => children.iter().flat_map(condition_columns).collect(),
        Condition::Expression(_) => Vec::new(),
    }
}

fn is_range_condition(c: &Condition) -> bool {
    match c {
        Condition::Simple { op, .. } => matches!(op, Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge | Operator::Between),
        Condition::Composite { children, .. } => children.iter().any(is_range_condition),
        Condition::Expression(_) => false,
    }
}

fn is_equality_condition(c: &Condition) -> bool {
    match c {
        Condition::Simple { op, .. } => matches!(op, Operator::Eq),
        Condition::Composite { children, .. } => children.iter().any(is_equality_condition),
        Condition::Expression(_) => false,
    }
}

/// Whether every column `condition` references is among `meta`'s columns.
/// Mirrors `index_aware.py`'s `_can_use_index`, which checks membership
/// rather than true composite-prefix order (full prefix semantics are
/// `composite.rs`'s concern at execution time, not at this planning stage).
fn can_use_index(meta: &IndexMetadata, condition: &Condition) -> bool {
    let columns = condition_columns(condition);
    if columns.is_empty() || !columns.iter().all(|c| meta.columns.contains(c)) {
        return false;
    }
    // Hash has no ordering to walk a range over (spec §4.2); every other
    // kind's `range` either works or is rejected per-call at execution time.
    !(meta.kind == IndexKind::Hash && is_range_condition(condition))
}

/// Rough specialization ranking used only to break an exact cost tie
/// (lower wins). Resolves spec §8 scenario 6's "with equal stats, hash
/// wins" worked example, which the stated cost formula alone leaves tied
/// for a pure equality query since neither path draws a range penalty.
fn kind_rank(kind: IndexKind) -> u8 {
    match kind {
        IndexKind::Hash => 0,
        IndexKind::Bitmap => 1,
        IndexKind::BTree => 2,
        IndexKind::Composite => 3,
        IndexKind::RTree | IndexKind::Gist => 4,
        IndexKind::Partial => 5,
    }
}

/// Plans access paths for logical queries against one manager's registered
/// indexes (spec §4.11).
pub struct QueryOptimizer<'a> {
    manager: &'a IndexManager,
}

impl<'a> QueryOptimizer<'a> {
    pub fn new(manager: &'a IndexManager) -> Self {
        QueryOptimizer { manager }
    }

    fn evaluate(&self, meta: &IndexMetadata, query: &LogicalQuery) -> Option<AccessPath> {
        let mut covered: Vec<String> = Vec::new();
        let mut is_range_scan = false;
        for predicate in &query.predicates {
            if !can_use_index(meta, predicate) {
                continue;
            }
            for col in condition_columns(predicate) {
                if !covered.contains(&col) {
                    covered.push(col);
                }
            }
            if is_range_condition(predicate) {
                is_range_scan = true;
            }
        }
        if covered.is_empty() {
            return None;
        }

        let stats = self.manager.get_index_statistics(&meta.name);
        let avg_lookup_time_ms = stats.as_ref().map(|s| s.usage.avg_read_time_ms).filter(|v| *v > 0.0).unwrap_or(1.0);
        let fragmentation = stats.as_ref().map(|s| s.size.fragmentation_ratio).unwrap_or(0.0);
        let estimated_rows = self.manager.with_index(&meta.name, |h| h.len()).unwrap_or(1000).max(1);

        let mut cost = avg_lookup_time_ms;
        if is_range_scan {
            cost *= estimated_rows as f64 / 100.0;
        }
        if fragmentation > 0.2 {
            cost *= 1.2;
        }

        let supports_ordering = query
            .order_by
            .as_ref()
            .map(|col| meta.kind == IndexKind::BTree && meta.columns.first().map(|c| c == col).unwrap_or(false))
            .unwrap_or(false);
        if supports_ordering {
            cost *= 0.8;
        }

        Some(AccessPath {
            index_name: meta.name.clone(),
            kind: meta.kind,
            columns_covered: covered,
            is_range_scan,
            supports_ordering,
            cost,
        })
    }

    /// Picks the cheapest usable access path (spec §4.11 steps 1-3),
    /// recording the decision into the advisor's workload tracking for its
    /// feedback loop. Returns `None` when no registered index covers any
    /// predicate (step 4: "fall through").
    pub fn plan(&self, query: &LogicalQuery) -> Option<AccessPath> {
        let candidates = self.manager.list_indexes(Some(&query.table));
        let paths: Vec<AccessPath> = candidates.iter().filter_map(|meta| self.evaluate(meta, query)).collect();
        if paths.is_empty() {
            return None;
        }

        let min_cost = paths.iter().map(|p| p.cost).fold(f64::INFINITY, f64::min);
        let best = paths
            .into_iter()
            .filter(|p| (p.cost - min_cost).abs() < 1e-9)
            .min_by_key(|p| kind_rank(p.kind))
            .expect("at least one path with the minimum cost");

        let is_equality = query.predicates.iter().any(is_equality_condition);
        self.manager.record_query_pattern(QueryPattern::new(query.table.clone(), best.columns_covered.clone(), is_equality, best.is_range_scan), None);

        Some(best)
    }
}

#[cfg(test)]
mod query_optimizer_test;
