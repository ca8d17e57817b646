//! Per-index statistics records (spec §3.4), grounded on `original_source`'s
//! `stats.py` dataclasses.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexUsageStats {
    pub total_reads: u64,
    pub total_writes: u64,
    pub avg_read_time_ms: f64,
    pub avg_write_time_ms: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub last_used: Option<DateTime<Utc>>,
}

impl IndexUsageStats {
    /// Folds one more read observation into the running average (spec §3.4).
    pub fn record_read(&mut self, elapsed_ms: f64, now: DateTime<Utc>) {
        self.total_reads += 1;
        self.avg_read_time_ms += (elapsed_ms - self.avg_read_time_ms) / self.total_reads as f64;
        self.last_used = Some(now);
    }

    pub fn record_write(&mut self, elapsed_ms: f64, now: DateTime<Utc>) {
        self.total_writes += 1;
        self.avg_write_time_ms += (elapsed_ms - self.avg_write_time_ms) / self.total_writes as f64;
        self.last_used = Some(now);
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexSizeStats {
    pub total_entries: u64,
    pub depth: u64,
    pub size_bytes: u64,
    pub fragmentation_ratio: f64,
    pub last_compacted: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConditionStats {
    pub condition_string: String,
    pub selectivity: f64,
    pub false_positive_rate: f64,
    pub evaluation_time_ms: f64,
    pub last_optimized: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexMaintenanceStats {
    pub last_reindex: Option<DateTime<Utc>>,
    pub last_analyze: Option<DateTime<Utc>>,
    pub last_vacuum: Option<DateTime<Utc>>,
    pub rebuild_count: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexStats {
    pub index_name: String,
    pub table_name: String,
    pub index_type: String,
    pub created_at: DateTime<Utc>,
    pub usage: IndexUsageStats,
    pub size: IndexSizeStats,
    pub condition: Option<IndexConditionStats>,
    pub maintenance: IndexMaintenanceStats,
}

impl IndexStats {
    pub fn new(index_name: impl Into<String>, table_name: impl Into<String>, index_type: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        IndexStats {
            index_name: index_name.into(),
            table_name: table_name.into(),
            index_type: index_type.into(),
            created_at,
            usage: IndexUsageStats::default(),
            size: IndexSizeStats::default(),
            condition: None,
            maintenance: IndexMaintenanceStats::default(),
        }
    }

    /// Whether this index currently looks like it needs optimization (spec
    /// §4.10's fragmentation/latency/false-positive thresholds, mirrored
    /// here at their `stats.py` defaults for a quick at-a-glance check; the
    /// trigger engine uses the configurable thresholds instead).
    pub fn needs_optimization(&self) -> bool {
        self.size.fragmentation_ratio > 0.3
            || self.usage.avg_read_time_ms > 100.0
            || self.condition.as_ref().map(|c| c.false_positive_rate > 0.2).unwrap_or(false)
    }
}

#[cfg(test)]
mod stats_test;
