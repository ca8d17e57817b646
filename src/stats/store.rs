//! Statistics store (spec §4.12), grounded on `original_source`'s
//! `StatisticsStore`/`StatisticsManager`. The original backs this with a
//! local sqlite3 file; `sqlite3` is not part of this crate's dependency
//! stack and persistence across process restarts is the storage adapter's
//! concern (spec §6.2), so this keeps the same time-series shape but in
//! process memory, guarded by `parking_lot::RwLock` per spec §4.12's
//! "single writer per index, concurrent readers" concurrency note.

use super::IndexStats;
use crate::config::StatisticsConfig;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

pub struct StatisticsStore {
    config: StatisticsConfig,
    history: RwLock<HashMap<String, Vec<IndexStats>>>,
    snapshots: RwLock<HashMap<String, Vec<Snapshot>>>,
    last_snapshot: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl StatisticsStore {
    pub fn new(config: StatisticsConfig) -> Self {
        StatisticsStore {
            config,
            history: RwLock::new(HashMap::new()),
            snapshots: RwLock::new(HashMap::new()),
            last_snapshot: RwLock::new(HashMap::new()),
        }
    }

    /// Appends the current statistics record, then takes a derived snapshot
    /// if the configured interval has elapsed since the last one
    /// (`original_source`'s `StatisticsManager.update_stats`).
    pub fn save_stats(&self, stats: IndexStats, now: DateTime<Utc>) {
        let name = stats.index_name.clone();
        self.history.write().entry(name.clone()).or_default().push(stats.clone());

        let due = {
            let last = self.last_snapshot.read();
            match last.get(&name) {
                None => true,
                Some(t) => (now - *t) >= Duration::seconds(self.config.snapshot_interval_seconds as i64),
            }
        };
        if due {
            self.take_snapshot(&stats, now);
            self.last_snapshot.write().insert(name, now);
        }
    }

    fn take_snapshot(&self, stats: &IndexStats, now: DateTime<Utc>) {
        let mut snaps = self.snapshots.write();
        let bucket = snaps.entry(stats.index_name.clone()).or_default();
        bucket.push(Snapshot {
            snapshot_type: "size".into(),
            data: serde_json::json!({
                "total_entries": stats.size.total_entries,
                "size_bytes": stats.size.size_bytes,
                "fragmentation": stats.size.fragmentation_ratio,
            }),
            timestamp: now,
        });
        bucket.push(Snapshot {
            snapshot_type: "performance".into(),
            data: serde_json::json!({
                "avg_read_time": stats.usage.avg_read_time_ms,
                "avg_write_time": stats.usage.avg_write_time_ms,
                "cache_hit_ratio": stats.usage.cache_hit_ratio(),
            }),
            timestamp: now,
        });
        if let Some(cond) = &stats.condition {
            bucket.push(Snapshot {
                snapshot_type: "condition".into(),
                data: serde_json::json!({
                    "selectivity": cond.selectivity,
                    "false_positive_rate": cond.false_positive_rate,
                    "evaluation_time": cond.evaluation_time_ms,
                }),
                timestamp: now,
            });
        }
    }

    pub fn save_snapshot(&self, index_name: &str, snapshot_type: &str, data: serde_json::Value, now: DateTime<Utc>) {
        self.snapshots.write().entry(index_name.to_string()).or_default().push(Snapshot {
            snapshot_type: snapshot_type.to_string(),
            data,
            timestamp: now,
        });
    }

    pub fn latest_stats(&self, index_name: &str) -> Option<IndexStats> {
        self.history.read().get(index_name).and_then(|v| v.last().cloned())
    }

    pub fn stats_history(&self, index_name: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Vec<IndexStats> {
        self.history
            .read()
            .get(index_name)
            .map(|v| {
                v.iter()
                    .filter(|s| start.map(|t| s.created_at >= t).unwrap_or(true) && end.map(|t| s.created_at <= t).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snapshots(&self, index_name: &str, snapshot_type: &str, limit: usize) -> Vec<Snapshot> {
        self.snapshots
            .read()
            .get(index_name)
            .map(|v| {
                let mut matching: Vec<Snapshot> = v.iter().filter(|s| s.snapshot_type == snapshot_type).cloned().collect();
                matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                matching.truncate(limit);
                matching
            })
            .unwrap_or_default()
    }

    /// Removes records and snapshots older than `retention_days` (spec
    /// §4.12). Stats are keyed by `created_at`, the timestamp the caller
    /// controls, rather than an internal wall-clock stamp, since the store
    /// never calls `Utc::now()` itself except to decide snapshot cadence.
    pub fn expire_older_than(&self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(self.config.retention_days as i64);
        for bucket in self.history.write().values_mut() {
            bucket.retain(|s| s.created_at >= cutoff);
        }
        for bucket in self.snapshots.write().values_mut() {
            bucket.retain(|s| s.timestamp >= cutoff);
        }
    }
}

#[cfg(test)]
mod store_test;
