//! The condition optimizer (spec §4.9), grounded on `original_source`'s
//! `optimizer.py` pass pipeline: remove-redundant, simplify-expressions,
//! merge, reorder-by-selectivity, run in that order and bottom-up over the
//! whole tree so nested composites are optimized before their parent.

use super::{Condition, Connective, Operand, Operator};
use crate::config::ConditionOptimizerConfig;
use crate::row::Scalar;

/// Counters returned alongside the optimized condition (spec §4.9).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptimizationStats {
    pub removed_redundant: usize,
    pub simplified_expressions: usize,
    pub merged_conditions: usize,
    pub original_depth: usize,
    pub optimized_depth: usize,
}

/// Applies the four-pass pipeline to `condition` once. Running it again on
/// the output must be a no-op (spec §8 "condition idempotence"); every pass
/// below only removes/merges/reorders, never introduces anything a second
/// pass would find fresh work on.
pub fn optimize(condition: &Condition, cfg: &ConditionOptimizerConfig) -> (Condition, OptimizationStats) {
    let original_depth = condition.depth();
    let mut stats = OptimizationStats {
        original_depth,
        ..Default::default()
    };
    let optimized = optimize_node(condition, cfg, &mut stats);
    stats.optimized_depth = optimized.depth();
    (optimized, stats)
}

fn optimize_node(cond: &Condition, cfg: &ConditionOptimizerConfig, stats: &mut OptimizationStats) -> Condition {
    match cond {
        Condition::Simple { .. } => cond.clone(),
        Condition::Expression(e) => {
            // Pass 2: simplify a single-comparison expression into a Simple.
            if let Some((col, op, val)) = e.as_single_comparison() {
                stats.simplified_expressions += 1;
                Condition::simple(col, op, Operand::Scalar(val.clone()))
            } else {
                cond.clone()
            }
        }
        Condition::Composite { connective, children } => {
            let mut kids: Vec<Condition> = children
                .iter()
                .map(|c| optimize_node(c, cfg, stats))
                .collect();

            flatten(*connective, &mut kids);
            remove_redundant(&mut kids, stats);
            merge(*connective, &mut kids, cfg, stats);
            reorder(&mut kids, cfg);

            match kids.len() {
                1 => kids.into_iter().next().unwrap(),
                _ => Condition::Composite {
                    connective: *connective,
                    children: kids,
                },
            }
        }
    }
}

/// Flattens nested AND-in-AND / OR-in-OR (spec §4.9 pass 1).
fn flatten(connective: Connective, kids: &mut Vec<Condition>) {
    let mut flattened = Vec::with_capacity(kids.len());
    for k in kids.drain(..) {
        match k {
            Condition::Composite { connective: inner, children } if inner == connective => {
                flattened.extend(children);
            }
            other => flattened.push(other),
        }
    }
    *kids = flattened;
}

/// Dedupes by canonical string and drops syntactic tautologies (spec §4.9
/// pass 1). Both kinds of removal count toward `removed_redundant`.
fn remove_redundant(kids: &mut Vec<Condition>, stats: &mut OptimizationStats) {
    let mut seen = std::collections::HashSet::new();
    let mut kept = Vec::with_capacity(kids.len());
    for k in kids.drain(..) {
        if k.is_tautology() {
            stats.removed_redundant += 1;
            continue;
        }
        let key = k.canonical_string();
        if seen.insert(key) {
            kept.push(k);
        } else {
            stats.removed_redundant += 1;
        }
    }
    *kids = kept;
}

/// Pass 3: merges `{col > a, col < b}` into `col BETWEEN (a, b)` within an
/// AND, `{col = v, col IN S}` into `col = v` (or falsifies the AND if
/// `v ∉ S`), and the OR-side `{col = v} | {col IN S}` into `col IN (S ∪
/// {v})`.
fn merge(connective: Connective, kids: &mut Vec<Condition>, cfg: &ConditionOptimizerConfig, stats: &mut OptimizationStats) {
    if kids.len() > cfg.max_merge_breadth {
        return;
    }
    match connective {
        Connective::And => merge_and(kids, stats),
        Connective::Or => merge_or(kids, stats),
    }
}

fn simple_parts(c: &Condition) -> Option<(&str, Operator, &Operand)> {
    match c {
        Condition::Simple { column, op, value, .. } => Some((column.as_str(), *op, value)),
        _ => None,
    }
}

fn merge_and(kids: &mut Vec<Condition>, stats: &mut OptimizationStats) {
    let mut i = 0;
    'outer: while i < kids.len() {
        let (col_i, op_i, val_i) = match simple_parts(&kids[i]) {
            Some(p) => (p.0.to_string(), p.1, p.2.clone()),
            None => {
                i += 1;
                continue;
            }
        };
        let mut j = i + 1;
        while j < kids.len() {
            let (col_j, op_j, val_j) = match simple_parts(&kids[j]) {
                Some(p) => (p.0.to_string(), p.1, p.2.clone()),
                None => {
                    j += 1;
                    continue;
                }
            };
            if col_i != col_j {
                j += 1;
                continue;
            }
            // {col > a, col < b} / {col >= a, col <= b} -> BETWEEN(a, b),
            // in either list order.
            let lower_from = |op: Operator, val: &Operand| match (op, val) {
                (Operator::Gt, Operand::Scalar(s)) | (Operator::Ge, Operand::Scalar(s)) => Some(s.clone()),
                _ => None,
            };
            let upper_from = |op: Operator, val: &Operand| match (op, val) {
                (Operator::Lt, Operand::Scalar(s)) | (Operator::Le, Operand::Scalar(s)) => Some(s.clone()),
                _ => None,
            };
            let merged = lower_from(op_i, &val_i)
                .zip(upper_from(op_j, &val_j))
                .or_else(|| lower_from(op_j, &val_j).zip(upper_from(op_i, &val_i)));
            if let Some((lo, hi)) = merged {
                kids[i] = Condition::simple(col_i.clone(), Operator::Between, Operand::Range(lo, hi));
                kids.remove(j);
                stats.merged_conditions += 1;
                continue 'outer;
            }
            // {col = v, col IN S}
            if let (Operator::Eq, Operand::Scalar(v)) = (op_i, &val_i) {
                if let (Operator::In, Operand::List(list)) = (op_j, &val_j) {
                    stats.merged_conditions += 1;
                    if list.iter().any(|s| s == v) {
                        kids.remove(j);
                        continue 'outer;
                    } else {
                        *kids = vec![Condition::or(vec![])];
                        return;
                    }
                }
            }
            if let (Operator::Eq, Operand::Scalar(v)) = (op_j, &val_j) {
                if let (Operator::In, Operand::List(list)) = (op_i, &val_i) {
                    stats.merged_conditions += 1;
                    if list.iter().any(|s| s == v) {
                        kids.remove(j);
                        continue 'outer;
                    } else {
                        *kids = vec![Condition::or(vec![])];
                        return;
                    }
                }
            }
            j += 1;
        }
        i += 1;
    }
}

fn merge_or(kids: &mut Vec<Condition>, stats: &mut OptimizationStats) {
    let mut i = 0;
    'outer: while i < kids.len() {
        let (col_i, op_i, val_i) = match simple_parts(&kids[i]) {
            Some(p) => (p.0.to_string(), p.1, p.2.clone()),
            None => {
                i += 1;
                continue;
            }
        };
        let mut j = i + 1;
        while j < kids.len() {
            let (col_j, op_j, val_j) = match simple_parts(&kids[j]) {
                Some(p) => (p.0.to_string(), p.1, p.2.clone()),
                None => {
                    j += 1;
                    continue;
                }
            };
            if col_i != col_j {
                j += 1;
                continue;
            }
            let eq_v = match (op_i, &val_i, op_j, &val_j) {
                (Operator::Eq, Operand::Scalar(v), Operator::In, _) => Some(v.clone()),
                (Operator::In, _, Operator::Eq, Operand::Scalar(v)) => Some(v.clone()),
                _ => None,
            };
            if let Some(v) = eq_v {
                let list_idx = if matches!(op_i, Operator::In) { i } else { j };
                let mut list = match if list_idx == i { &val_i } else { &val_j } {
                    Operand::List(l) => l.clone(),
                    _ => Vec::new(),
                };
                if !list.iter().any(|s| *s == v) {
                    list.push(v);
                }
                kids[list_idx] = Condition::simple(col_i.clone(), Operator::In, Operand::List(list));
                let drop_idx = if list_idx == i { j } else { i };
                kids.remove(drop_idx);
                stats.merged_conditions += 1;
                continue 'outer;
            }
            j += 1;
        }
        i += 1;
    }
}

/// Pass 4: sorts children by estimated selectivity ascending (most
/// selective first), using live statistics when the caller supplies them
/// via `reorder_with_selectivity`, falling back to the static table (spec
/// §4.9) otherwise.
fn reorder(kids: &mut [Condition], _cfg: &ConditionOptimizerConfig) {
    kids.sort_by(|a, b| {
        a.estimated_selectivity()
            .partial_cmp(&b.estimated_selectivity())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod optimizer_test;
