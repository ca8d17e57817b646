//! `sidx`: a pluggable, multi-strategy secondary-index engine for an
//! analytical/OLTP table store.
//!
//! An engine owns a family of index kinds behind one uniform
//! [`index::IndexHandle`] contract (B-tree, hash, bitmap, R-tree, GiST,
//! composite, partial) and an [`manager::IndexManager`] that dispatches row
//! mutations to every index registered on a table, collects statistics,
//! fires maintenance triggers, and can recommend new indexes from observed
//! query patterns.
//!
//! Start with [`manager::IndexManager`] and [`manager::IndexCreationRequest`]
//! to create and populate indexes; [`condition::Condition`] describes the
//! predicate a partial index gates on; [`config::EngineConfig`] loads every
//! tunable as one TOML document.

mod advisor;
mod condition;
mod config;
mod error;
mod geometry;
mod index;
mod manager;
mod metrics;
mod query_optimizer;
mod row;
mod stats;
mod trends;
mod triggers;
mod workers;

pub use crate::advisor::{ColumnStats, IndexAdvisor, IndexRecommendation, QueryPattern};
pub use crate::condition::expr::{Expr, ParseError};
pub use crate::condition::optimizer::{optimize as optimize_condition, OptimizationStats};
pub use crate::condition::{Condition, Connective, Operand, Operator};
pub use crate::config::{ConditionOptimizerConfig, EngineConfig, IndexManagerConfig, StatisticsConfig, TriggerConfig};
pub use crate::error::{Error, Result};
pub use crate::geometry::BoundingBox;
pub use crate::index::{ConditionSnapshot, IndexHandle, IndexKind, IndexMetadata, Key, LifecycleState, Properties};
pub use crate::manager::{IndexCreationRequest, IndexHealth, IndexManager};
pub use crate::metrics::{InMemorySink, MetricsSink, NoopSink};
pub use crate::query_optimizer::{AccessPath, LogicalQuery, QueryOptimizer};
pub use crate::row::{Rid, Row, RowSource, Scalar, VecRowSource};
pub use crate::stats::{IndexConditionStats, IndexMaintenanceStats, IndexSizeStats, IndexStats, IndexUsageStats};
pub use crate::trends::{Anomaly, TrendAnalysis, TrendAnalyzer, TrendType};
pub use crate::triggers::{MaintenanceAction, TriggerEngine, TriggerEvent, TriggerType};
pub use crate::workers::{run_fallible, Priority, WorkerPool};
