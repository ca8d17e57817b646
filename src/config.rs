//! Configuration bags recognized by the manager, trigger engine, statistics
//! store and condition optimizer (spec §6.3).
//!
//! All of these are plain `serde`-derived structs so they can be loaded from
//! TOML (`toml::from_str`) the way `rdms`'s `bin/rdms-perf` tools read their
//! config files, or constructed in-process with `Default::default()`.

use serde::{Deserialize, Serialize};

/// Index-manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexManagerConfig {
    pub max_workers: usize,
    pub enable_auto_maintenance: bool,
    pub enable_advisor: bool,
    pub maintenance_interval_seconds: u64,
    pub operation_timeout_seconds: u64,
}

impl Default for IndexManagerConfig {
    fn default() -> Self {
        IndexManagerConfig {
            max_workers: 4,
            enable_auto_maintenance: true,
            enable_advisor: true,
            maintenance_interval_seconds: 300,
            operation_timeout_seconds: 10,
        }
    }
}

/// Trigger-engine thresholds and cadence (spec §4.10, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriggerConfig {
    pub check_interval_seconds: u64,
    pub cooldown_minutes: u64,
    pub min_sample_size: u64,
    pub fragmentation_threshold: f64,
    pub read_latency_threshold_ms: f64,
    pub write_latency_threshold_ms: f64,
    pub cache_hit_ratio_threshold: f64,
    pub size_growth_threshold: f64,
    pub false_positive_rate_threshold: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            check_interval_seconds: 300,
            cooldown_minutes: 60,
            min_sample_size: 100,
            fragmentation_threshold: 0.3,
            read_latency_threshold_ms: 100.0,
            write_latency_threshold_ms: 200.0,
            cache_hit_ratio_threshold: 0.7,
            size_growth_threshold: 0.5,
            false_positive_rate_threshold: 0.2,
        }
    }
}

/// Statistics-store retention and snapshot cadence (spec §3.4, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatisticsConfig {
    pub retention_days: u32,
    pub snapshot_interval_seconds: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        StatisticsConfig {
            retention_days: 30,
            snapshot_interval_seconds: 3600,
        }
    }
}

/// Condition optimizer tuning (spec §4.9, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConditionOptimizerConfig {
    pub max_merge_breadth: usize,
}

impl Default for ConditionOptimizerConfig {
    fn default() -> Self {
        ConditionOptimizerConfig {
            max_merge_breadth: 64,
        }
    }
}

/// Top-level configuration bag loadable as a single TOML document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub manager: IndexManagerConfig,
    pub trigger: TriggerConfig,
    pub statistics: StatisticsConfig,
    pub condition_optimizer: ConditionOptimizerConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        toml::from_str(s).map_err(|e| crate::Error::corruption("config", e.to_string()))
    }
}

#[cfg(test)]
mod config_test;
