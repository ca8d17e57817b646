//! Regex predicate strategy (spec §4.5), grounded on `original_source`'s
//! `strategies/regex.py`: predicates summarize a value or a query pattern
//! as a literal prefix/suffix, a set of required literal substrings, and a
//! length window, so most subtrees can be pruned without running the full
//! regex engine.

use super::PredicateStrategy;
use crate::error::{Error, Result};
use crate::index::Key;
use std::collections::BTreeSet;

const SKELETON_BOUND: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct RegexPredicate {
    /// The exact stored value, present only for an uncompressed leaf.
    pub text: Option<String>,
    /// The raw pattern source, present only for a query predicate.
    pub pattern: Option<String>,
    pub prefix: String,
    pub suffix: String,
    pub required_literals: BTreeSet<String>,
    pub min_length: usize,
    pub max_length: Option<usize>,
    pub lossy: bool,
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    let ra: Vec<char> = a.chars().rev().collect();
    let rb: Vec<char> = b.chars().rev().collect();
    ra.iter().zip(rb.iter()).take_while(|(x, y)| x == y).count()
}

fn is_metachar(c: char) -> bool {
    matches!(c, '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\')
}

fn literal_runs(pattern: &str) -> Vec<String> {
    pattern
        .split(is_metachar)
        .filter(|s| s.len() >= 2)
        .map(|s| s.to_string())
        .collect()
}

pub struct RegexStrategy;

impl PredicateStrategy for RegexStrategy {
    type Predicate = RegexPredicate;

    fn consistent(&self, entry: &Self::Predicate, query: &Self::Predicate) -> bool {
        if let Some(qmax) = query.max_length {
            if entry.min_length > qmax {
                return false;
            }
        }
        if let Some(emax) = entry.max_length {
            if emax < query.min_length {
                return false;
            }
        }
        if !(entry.prefix.starts_with(query.prefix.as_str()) || query.prefix.starts_with(entry.prefix.as_str())) {
            return false;
        }
        if !(entry.suffix.ends_with(query.suffix.as_str()) || query.suffix.ends_with(entry.suffix.as_str())) {
            return false;
        }
        for lit in &query.required_literals {
            let covered = match &entry.text {
                Some(t) => t.contains(lit.as_str()),
                None => entry.required_literals.iter().any(|e| e.contains(lit.as_str()) || lit.contains(e.as_str())),
            };
            if !covered {
                return false;
            }
        }
        if let (Some(text), Some(pattern)) = (&entry.text, &query.pattern) {
            if let Ok(re) = regex::Regex::new(pattern) {
                return re.is_match(text);
            }
        }
        true
    }

    fn union(&self, entries: &[Self::Predicate]) -> Self::Predicate {
        let mut iter = entries.iter();
        let first = match iter.next() {
            Some(f) => f.clone(),
            None => {
                return RegexPredicate {
                    text: None,
                    pattern: None,
                    prefix: String::new(),
                    suffix: String::new(),
                    required_literals: BTreeSet::new(),
                    min_length: 0,
                    max_length: Some(0),
                    lossy: true,
                }
            }
        };
        let mut prefix = first.prefix.clone();
        let mut suffix = first.suffix.clone();
        let mut required = first.required_literals.clone();
        let mut min_length = first.min_length;
        let mut max_length = first.max_length;
        for e in iter {
            let p = common_prefix_len(&prefix, &e.prefix);
            prefix.truncate(prefix.char_indices().nth(p).map(|(i, _)| i).unwrap_or(prefix.len()));
            let s = common_suffix_len(&suffix, &e.suffix);
            let start = suffix.char_indices().rev().nth(s.saturating_sub(1)).map(|(i, _)| i).unwrap_or(0);
            suffix = if s == 0 { String::new() } else { suffix[start..].to_string() };
            required = required.intersection(&e.required_literals).cloned().collect();
            min_length = min_length.min(e.min_length);
            max_length = match (max_length, e.max_length) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
        }
        RegexPredicate {
            text: None,
            pattern: None,
            prefix,
            suffix,
            required_literals: required,
            min_length,
            max_length,
            lossy: true,
        }
    }

    fn compress(&self, entry: &Self::Predicate) -> Self::Predicate {
        let needs_compression = entry.text.as_ref().map(|t| t.chars().count() > SKELETON_BOUND * 2).unwrap_or(false);
        if !needs_compression {
            return entry.clone();
        }
        let text = entry.text.as_ref().unwrap();
        let chars: Vec<char> = text.chars().collect();
        let prefix: String = chars.iter().take(SKELETON_BOUND).collect();
        let suffix: String = chars.iter().rev().take(SKELETON_BOUND).collect::<Vec<_>>().into_iter().rev().collect();
        RegexPredicate {
            text: None,
            pattern: None,
            prefix,
            suffix,
            required_literals: entry.required_literals.clone(),
            min_length: entry.min_length,
            max_length: entry.max_length,
            lossy: true,
        }
    }

    fn penalty(&self, a: &Self::Predicate, b: &Self::Predicate) -> f64 {
        let prefix_common = common_prefix_len(&a.prefix, &b.prefix);
        let prefix_mismatch = a.prefix.chars().count().max(b.prefix.chars().count()).saturating_sub(prefix_common);
        let suffix_common = common_suffix_len(&a.suffix, &b.suffix);
        let suffix_mismatch = a.suffix.chars().count().max(b.suffix.chars().count()).saturating_sub(suffix_common);
        let inter = a.required_literals.intersection(&b.required_literals).count() as f64;
        let union = a.required_literals.union(&b.required_literals).count() as f64;
        let jaccard = if union == 0.0 { 1.0 } else { inter / union };
        let literal_term = 1.0 - jaccard;
        let len_window = (a.min_length as f64 - b.min_length as f64).abs() / 100.0;
        (prefix_mismatch + suffix_mismatch) as f64 + literal_term + len_window
    }

    fn pick_split(&self, entries: &[Self::Predicate]) -> (Vec<usize>, Vec<usize>) {
        super::two_seed_split(entries, |a, b| self.penalty(a, b))
    }

    fn predicate_for_key(&self, key: &Key) -> Result<Self::Predicate> {
        match key {
            Key::Text(s) | Key::Str(s) => {
                let len = s.chars().count();
                let mut required = BTreeSet::new();
                if s.len() >= 2 {
                    required.insert(s.clone());
                }
                Ok(RegexPredicate {
                    text: Some(s.clone()),
                    pattern: None,
                    prefix: s.clone(),
                    suffix: s.clone(),
                    required_literals: required,
                    min_length: len,
                    max_length: Some(len),
                    lossy: false,
                })
            }
            _ => Err(Error::unsupported("regex", "regex predicates require a text key")),
        }
    }

    fn query_predicate(&self, key: &Key) -> Result<Self::Predicate> {
        let pattern = match key {
            Key::Text(s) | Key::Str(s) => s,
            _ => return Err(Error::unsupported("regex", "regex queries require a text key")),
        };
        let anchored_start = pattern.starts_with('^');
        let anchored_end = pattern.ends_with('$') && !pattern.ends_with("\\$");
        let body: &str = {
            let s = if anchored_start { &pattern[1..] } else { pattern.as_str() };
            if anchored_end { &s[..s.len() - 1] } else { s }
        };
        // prefix/suffix only constrain the *start*/*end* of a match, so they
        // only carry meaning when the pattern is actually anchored there;
        // otherwise leave them empty (a trivially-true constraint) and rely
        // on required_literals to still catch the substring.
        let raw_prefix: String = body.chars().take_while(|c| !is_metachar(*c)).collect();
        let raw_suffix: String = body.chars().rev().take_while(|c| !is_metachar(*c)).collect::<Vec<_>>().into_iter().rev().collect();
        let prefix = if anchored_start { raw_prefix } else { String::new() };
        let suffix = if anchored_end { raw_suffix } else { String::new() };
        let required: BTreeSet<String> = literal_runs(body).into_iter().collect();
        // A max length only holds if the match is pinned at both ends and the
        // body has no metacharacters that could stretch it (quantifiers,
        // alternation, wildcards).
        let fully_literal = !body.chars().any(is_metachar);
        let max_length = if anchored_start && anchored_end && fully_literal {
            Some(body.chars().count())
        } else {
            None
        };
        let min_length = prefix.chars().count() + suffix.chars().count();
        Ok(RegexPredicate {
            text: None,
            pattern: Some(pattern.clone()),
            prefix,
            suffix,
            required_literals: required,
            min_length,
            max_length,
            lossy: false,
        })
    }
}

#[cfg(test)]
mod regex_strategy_test;
