//! Trigram predicate strategy (spec §4.5), grounded on
//! `original_source`'s `strategies/trigram.py`: predicates are sets of
//! character trigrams from text padded with two leading and two trailing
//! spaces.

use super::PredicateStrategy;
use crate::error::{Error, Result};
use crate::index::Key;
use rand::seq::IteratorRandom;
use std::collections::BTreeSet;

const SAMPLE_CAP: usize = 64;
const SIMILARITY_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct TrigramPredicate {
    pub trigrams: BTreeSet<String>,
    pub lossy: bool,
}

fn trigrams_of(text: &str) -> BTreeSet<String> {
    let padded = format!("  {}  ", text);
    let chars: Vec<char> = padded.chars().collect();
    let mut set = BTreeSet::new();
    if chars.len() >= 3 {
        for w in chars.windows(3) {
            set.insert(w.iter().collect());
        }
    }
    set
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        inter / union
    }
}

pub struct TrigramStrategy;

impl PredicateStrategy for TrigramStrategy {
    type Predicate = TrigramPredicate;

    fn consistent(&self, entry: &Self::Predicate, query: &Self::Predicate) -> bool {
        if entry.lossy {
            jaccard(&entry.trigrams, &query.trigrams) >= SIMILARITY_THRESHOLD
        } else {
            entry.trigrams.is_superset(&query.trigrams)
        }
    }

    fn union(&self, entries: &[Self::Predicate]) -> Self::Predicate {
        let mut out = BTreeSet::new();
        let mut lossy = false;
        for e in entries {
            out.extend(e.trigrams.iter().cloned());
            lossy |= e.lossy;
        }
        TrigramPredicate { trigrams: out, lossy }
    }

    fn compress(&self, entry: &Self::Predicate) -> Self::Predicate {
        if entry.trigrams.len() <= SAMPLE_CAP {
            return entry.clone();
        }
        let mut rng = rand::thread_rng();
        let sampled: BTreeSet<String> = entry.trigrams.iter().cloned().choose_multiple(&mut rng, SAMPLE_CAP).into_iter().collect();
        TrigramPredicate { trigrams: sampled, lossy: true }
    }

    fn penalty(&self, a: &Self::Predicate, b: &Self::Predicate) -> f64 {
        b.trigrams.difference(&a.trigrams).count() as f64
    }

    fn pick_split(&self, entries: &[Self::Predicate]) -> (Vec<usize>, Vec<usize>) {
        super::two_seed_split(entries, |a, b| 1.0 - jaccard(&a.trigrams, &b.trigrams))
    }

    fn predicate_for_key(&self, key: &Key) -> Result<Self::Predicate> {
        match key {
            Key::Text(s) | Key::Str(s) => Ok(TrigramPredicate { trigrams: trigrams_of(s), lossy: false }),
            _ => Err(Error::unsupported("trigram", "trigram predicates require a text key")),
        }
    }
}

#[cfg(test)]
mod trigram_test;
