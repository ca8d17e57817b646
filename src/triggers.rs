//! Trigger engine (spec §4.10), grounded on `original_source`'s
//! `triggers.py`: polls latest per-index statistics and fires an action
//! when a metric crosses its threshold and that (index, trigger-type)'s
//! cooldown has elapsed.

use crate::config::TriggerConfig;
use crate::stats::store::StatisticsStore;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerType {
    Fragmentation,
    PerformanceRead,
    PerformanceWrite,
    Cache,
    Size,
    ErrorRate,
}

/// The action a fired trigger recommends (spec §4.10's action column).
/// `triggers.py` dispatches these as closures over private index methods;
/// here they are plain data the caller (the manager) executes, since the
/// trigger engine itself has no index handles to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceAction {
    Rebuild,
    AnalyzeAndReplan,
    Analyze,
    AdjustCacheSizing,
    CompactOrPartition,
    ReoptimizeCondition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub trigger_type: TriggerType,
    pub index_name: String,
    pub timestamp: DateTime<Utc>,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
    pub action: MaintenanceAction,
}

/// Monitors index statistics and decides which maintenance actions are due
/// (spec §4.10). Owns no index handles; `manager.rs` calls `check` per
/// index and executes whatever actions come back.
pub struct TriggerEngine {
    config: TriggerConfig,
    last_action: Mutex<HashMap<(String, TriggerType), DateTime<Utc>>>,
}

impl TriggerEngine {
    pub fn new(config: TriggerConfig) -> Self {
        TriggerEngine {
            config,
            last_action: Mutex::new(HashMap::new()),
        }
    }

    fn cooldown_elapsed(&self, index_name: &str, trigger_type: TriggerType, now: DateTime<Utc>) -> bool {
        let last = self.last_action.lock();
        match last.get(&(index_name.to_string(), trigger_type)) {
            None => true,
            Some(t) => (now - *t) >= Duration::minutes(self.config.cooldown_minutes as i64),
        }
    }

    fn record_fired(&self, index_name: &str, trigger_type: TriggerType, now: DateTime<Utc>) {
        self.last_action.lock().insert((index_name.to_string(), trigger_type), now);
    }

    /// Checks every trigger condition against an index's latest stats and
    /// returns the events that fired, respecting each trigger's cooldown.
    pub fn check(&self, store: &StatisticsStore, index_name: &str, now: DateTime<Utc>) -> Vec<TriggerEvent> {
        let stats = match store.latest_stats(index_name) {
            Some(s) => s,
            None => return Vec::new(),
        };
        let mut events = Vec::new();

        if stats.size.fragmentation_ratio > self.config.fragmentation_threshold && self.cooldown_elapsed(index_name, TriggerType::Fragmentation, now) {
            events.push(TriggerEvent {
                trigger_type: TriggerType::Fragmentation,
                index_name: index_name.to_string(),
                timestamp: now,
                current_value: stats.size.fragmentation_ratio,
                threshold: self.config.fragmentation_threshold,
                message: "high fragmentation detected".into(),
                action: MaintenanceAction::Rebuild,
            });
        }

        if stats.usage.avg_read_time_ms > self.config.read_latency_threshold_ms && self.cooldown_elapsed(index_name, TriggerType::PerformanceRead, now) {
            events.push(TriggerEvent {
                trigger_type: TriggerType::PerformanceRead,
                index_name: index_name.to_string(),
                timestamp: now,
                current_value: stats.usage.avg_read_time_ms,
                threshold: self.config.read_latency_threshold_ms,
                message: "slow read performance detected".into(),
                action: MaintenanceAction::AnalyzeAndReplan,
            });
        }

        if stats.usage.avg_write_time_ms > self.config.write_latency_threshold_ms && self.cooldown_elapsed(index_name, TriggerType::PerformanceWrite, now) {
            events.push(TriggerEvent {
                trigger_type: TriggerType::PerformanceWrite,
                index_name: index_name.to_string(),
                timestamp: now,
                current_value: stats.usage.avg_write_time_ms,
                threshold: self.config.write_latency_threshold_ms,
                message: "slow write performance detected".into(),
                action: MaintenanceAction::Analyze,
            });
        }

        let cache_total = stats.usage.cache_hits + stats.usage.cache_misses;
        if cache_total >= self.config.min_sample_size && self.cooldown_elapsed(index_name, TriggerType::Cache, now) {
            let ratio = stats.usage.cache_hit_ratio();
            if ratio < self.config.cache_hit_ratio_threshold {
                events.push(TriggerEvent {
                    trigger_type: TriggerType::Cache,
                    index_name: index_name.to_string(),
                    timestamp: now,
                    current_value: ratio,
                    threshold: self.config.cache_hit_ratio_threshold,
                    message: "low cache hit ratio detected".into(),
                    action: MaintenanceAction::AdjustCacheSizing,
                });
            }
        }

        if self.cooldown_elapsed(index_name, TriggerType::Size, now) {
            let growth = Self::growth_rate(store, index_name, now);
            if growth > self.config.size_growth_threshold {
                events.push(TriggerEvent {
                    trigger_type: TriggerType::Size,
                    index_name: index_name.to_string(),
                    timestamp: now,
                    current_value: growth,
                    threshold: self.config.size_growth_threshold,
                    message: "rapid size growth detected".into(),
                    action: MaintenanceAction::CompactOrPartition,
                });
            }
        }

        if let Some(cond) = &stats.condition {
            if cond.false_positive_rate > self.config.false_positive_rate_threshold && self.cooldown_elapsed(index_name, TriggerType::ErrorRate, now) {
                events.push(TriggerEvent {
                    trigger_type: TriggerType::ErrorRate,
                    index_name: index_name.to_string(),
                    timestamp: now,
                    current_value: cond.false_positive_rate,
                    threshold: self.config.false_positive_rate_threshold,
                    message: "high false positive rate detected".into(),
                    action: MaintenanceAction::ReoptimizeCondition,
                });
            }
        }

        events
    }

    /// Day-over-day growth in entry count, as a fraction of the starting
    /// size (spec §4.10's "size growth" trigger).
    fn growth_rate(store: &StatisticsStore, index_name: &str, now: DateTime<Utc>) -> f64 {
        let history = store.stats_history(index_name, Some(now - Duration::days(1)), Some(now));
        if history.len() < 2 {
            return 0.0;
        }
        let initial = history.first().unwrap().size.total_entries;
        let final_size = history.last().unwrap().size.total_entries;
        if initial == 0 {
            0.0
        } else {
            (final_size as f64 - initial as f64) / initial as f64
        }
    }

    /// Marks every event's trigger type as having just fired, for cooldown
    /// purposes (spec §4.10). Call after the caller has actually attempted
    /// (not necessarily succeeded at) the corresponding action, matching
    /// `triggers.py`'s `execute_optimizations` which stamps
    /// `_last_optimization` regardless of individual action outcomes.
    pub fn record_events(&self, events: &[TriggerEvent]) {
        for e in events {
            self.record_fired(&e.index_name, e.trigger_type, e.timestamp);
            info!(index = %e.index_name, trigger = ?e.trigger_type, "trigger fired");
        }
    }
}

/// Runs a single maintenance action against whatever index-shaped handle the
/// caller supplies. `triggers.py`'s per-action methods are mostly stubs
/// ("implementation depends on specific index type"); this mirrors that by
/// accepting a small closure set from the caller rather than hard-coding
/// index internals the trigger engine has no business knowing.
pub fn apply_action<F>(action: MaintenanceAction, mut run: F) -> bool
where
    F: FnMut(MaintenanceAction) -> crate::Result<()>,
{
    match run(action) {
        Ok(()) => true,
        Err(e) => {
            warn!(?action, error = %e, "maintenance action failed");
            false
        }
    }
}

#[cfg(test)]
mod triggers_test;
