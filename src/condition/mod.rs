//! The condition algebra used by partial indexes (spec §3.3) and its
//! optimizer (§4.9), grounded on `original_source`'s `partial.py` (the
//! `Condition` tree) and `optimizer.py` (the pass pipeline).

pub mod expr;
pub mod optimizer;

use crate::row::{Row, Scalar};
use std::fmt;

/// Comparison/membership operator of a `Simple` condition (spec §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Like,
    NotLike,
    IsNull,
    IsNotNull,
    Between,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
        };
        write!(f, "{}", s)
    }
}

/// The value operand(s) of a `Simple` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Range(Scalar, Scalar),
    /// A reference to another column, e.g. the right-hand side of
    /// `col = col` — the canonical tautology shape the optimizer's
    /// remove-redundant pass recognizes (spec §3.3, §4.9).
    Column(String),
    None,
}

/// Boolean AND/OR connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if matches!(self, Connective::And) { "AND" } else { "OR" })
    }
}

/// A condition tree node (spec §3.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Simple {
        column: String,
        op: Operator,
        value: Operand,
        case_sensitive: bool,
    },
    Composite {
        connective: Connective,
        children: Vec<Condition>,
    },
    Expression(expr::Expr),
}

impl Condition {
    pub fn simple(column: impl Into<String>, op: Operator, value: Operand) -> Self {
        Condition::Simple {
            column: column.into(),
            op,
            value,
            case_sensitive: true,
        }
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Condition::Composite {
            connective: Connective::And,
            children,
        }
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Composite {
            connective: Connective::Or,
            children,
        }
    }

    /// Evaluates the condition against `row`. Per spec §3.3: a missing
    /// referenced column yields `false`; any evaluation error yields `false`
    /// — this method never panics and never returns a `Result`.
    pub fn evaluate(&self, row: &Row) -> bool {
        match self {
            Condition::Simple {
                column,
                op,
                value,
                case_sensitive,
            } => evaluate_simple(row, column, *op, value, *case_sensitive),
            Condition::Composite { connective, children } => match connective {
                Connective::And => children.iter().all(|c| c.evaluate(row)),
                Connective::Or => children.iter().any(|c| c.evaluate(row)),
            },
            Condition::Expression(e) => expr::eval_bool(e, row).unwrap_or(false),
        }
    }

    /// A canonical string used by the optimizer's dedup pass and for
    /// recording `condition_string` in statistics (spec §3.4, §4.9).
    pub fn canonical_string(&self) -> String {
        match self {
            Condition::Simple {
                column,
                op,
                value,
                case_sensitive,
            } => {
                let v = match value {
                    Operand::Scalar(s) => s.to_string(),
                    Operand::List(vs) => format!(
                        "({})",
                        vs.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
                    ),
                    Operand::Range(a, b) => format!("{} AND {}", a, b),
                    Operand::Column(c) => c.clone(),
                    Operand::None => String::new(),
                };
                if *case_sensitive {
                    format!("{} {} {}", column, op, v)
                } else {
                    format!("{} {} {} [ci]", column, op, v)
                }
            }
            Condition::Composite { connective, children } => {
                let inner = children
                    .iter()
                    .map(|c| c.canonical_string())
                    .collect::<Vec<_>>()
                    .join(&format!(" {} ", connective));
                format!("({})", inner)
            }
            Condition::Expression(e) => format!("EXPR({})", e.source),
        }
    }

    /// A tautology recognizable syntactically: `col = col`.
    pub fn is_tautology(&self) -> bool {
        matches!(
            self,
            Condition::Simple { column, op: Operator::Eq, value: Operand::Column(rhs), .. }
                if rhs == column
        )
    }

    /// Tree depth, used for the optimizer's before/after counters.
    pub fn depth(&self) -> usize {
        match self {
            Condition::Simple { .. } | Condition::Expression(_) => 1,
            Condition::Composite { children, .. } => {
                1 + children.iter().map(Condition::depth).max().unwrap_or(0)
            }
        }
    }

    /// Fallback selectivity estimate used when no statistics are available
    /// (spec §4.9 pass 4 table).
    pub fn estimated_selectivity(&self) -> f64 {
        match self {
            Condition::Simple { op, .. } => match op {
                Operator::Eq => 0.1,
                Operator::In => 0.3,
                Operator::Between => 0.4,
                Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => 0.5,
                Operator::Ne => 0.9,
                Operator::Like => 0.7,
                Operator::NotLike => 0.8,
                Operator::NotIn => 0.7,
                Operator::IsNull => 0.05,
                Operator::IsNotNull => 0.95,
            },
            Condition::Composite { connective, children } => {
                if children.is_empty() {
                    return 1.0;
                }
                match connective {
                    Connective::And => children.iter().map(Condition::estimated_selectivity).product(),
                    Connective::Or => {
                        let sum: f64 = children.iter().map(Condition::estimated_selectivity).sum();
                        sum / children.len() as f64
                    }
                }
            }
            Condition::Expression(_) => 0.8,
        }
    }
}

fn evaluate_simple(row: &Row, column: &str, op: Operator, value: &Operand, case_sensitive: bool) -> bool {
    let lhs = match row.get(column) {
        Some(v) => v,
        None => return false,
    };
    // A `Column` operand resolves against the same row before any
    // comparison; missing columns fall through to `false` like any other
    // evaluation gap (spec §3.3).
    let resolved;
    let value = match value {
        Operand::Column(rhs_col) => match row.get(rhs_col) {
            Some(v) => {
                resolved = Operand::Scalar(v.clone());
                &resolved
            }
            None => return false,
        },
        other => other,
    };
    match op {
        Operator::IsNull => lhs.is_null(),
        Operator::IsNotNull => !lhs.is_null(),
        _ if lhs.is_null() => false,
        Operator::Eq => scalar_eq(lhs, value, case_sensitive),
        Operator::Ne => !scalar_eq(lhs, value, case_sensitive),
        Operator::Lt => cmp_scalar(lhs, value).map(|o| o.is_lt()).unwrap_or(false),
        Operator::Le => cmp_scalar(lhs, value).map(|o| o.is_le()).unwrap_or(false),
        Operator::Gt => cmp_scalar(lhs, value).map(|o| o.is_gt()).unwrap_or(false),
        Operator::Ge => cmp_scalar(lhs, value).map(|o| o.is_ge()).unwrap_or(false),
        Operator::In => match value {
            Operand::List(list) => list.iter().any(|v| scalar_eq(lhs, &Operand::Scalar(v.clone()), case_sensitive)),
            _ => false,
        },
        Operator::NotIn => match value {
            Operand::List(list) => !list.iter().any(|v| scalar_eq(lhs, &Operand::Scalar(v.clone()), case_sensitive)),
            _ => false,
        },
        Operator::Between => match value {
            Operand::Range(lo, hi) => {
                cmp_scalar(lhs, &Operand::Scalar(lo.clone())).map(|o| o.is_ge()).unwrap_or(false)
                    && cmp_scalar(lhs, &Operand::Scalar(hi.clone())).map(|o| o.is_le()).unwrap_or(false)
            }
            _ => false,
        },
        Operator::Like | Operator::NotLike => {
            let pattern = match value {
                Operand::Scalar(Scalar::Str(p)) => p.as_str(),
                _ => return false,
            };
            let text = match lhs.as_str() {
                Some(t) => t,
                None => return false,
            };
            let matched = like_match(text, pattern, case_sensitive);
            if matches!(op, Operator::Like) {
                matched
            } else {
                !matched
            }
        }
    }
}

fn scalar_eq(lhs: &Scalar, value: &Operand, case_sensitive: bool) -> bool {
    let rhs = match value {
        Operand::Scalar(s) => s,
        _ => return false,
    };
    match (lhs, rhs) {
        (Scalar::Str(a), Scalar::Str(b)) if !case_sensitive => a.to_lowercase() == b.to_lowercase(),
        _ => lhs.partial_cmp(rhs) == Some(std::cmp::Ordering::Equal),
    }
}

fn cmp_scalar(lhs: &Scalar, value: &Operand) -> Option<std::cmp::Ordering> {
    match value {
        Operand::Scalar(rhs) => lhs.partial_cmp(rhs),
        _ => None,
    }
}

/// Translates `%` (any run) and `_` (one character) LIKE syntax into a
/// literal match, honoring `\[`/`\]` as escaped literal brackets (spec
/// §3.3).
pub fn like_match(text: &str, pattern: &str, case_sensitive: bool) -> bool {
    let (text, pattern) = if case_sensitive {
        (text.to_string(), pattern.to_string())
    } else {
        (text.to_lowercase(), pattern.to_lowercase())
    };
    like_match_chars(&text.chars().collect::<Vec<_>>(), &pattern.chars().collect::<Vec<_>>())
}

fn like_match_chars(text: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('%') => {
            like_match_chars(text, &pattern[1..])
                || (!text.is_empty() && like_match_chars(&text[1..], pattern))
        }
        Some('_') => !text.is_empty() && like_match_chars(&text[1..], &pattern[1..]),
        Some('\\') if pattern.len() > 1 && (pattern[1] == '[' || pattern[1] == ']') => {
            !text.is_empty() && text[0] == pattern[1] && like_match_chars(&text[1..], &pattern[2..])
        }
        Some(c) => !text.is_empty() && text[0] == *c && like_match_chars(&text[1..], &pattern[1..]),
    }
}
