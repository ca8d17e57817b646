//! Index manager (spec §4.8, §6.1), grounded on `original_source`'s
//! `manager.py` (`IndexManager`) and `core.py`. Owns every registered
//! index's lifecycle behind its own `parking_lot::RwLock` (spec §5: "each
//! index owns a reentrant read-write lock"), dispatches row mutations to
//! the indexes of the affected table, and drives the statistics/trigger/
//! advisor loop that `manager.py`'s `_collect_stats` and maintenance thread
//! perform with a plain `ThreadPoolExecutor`.

use crate::advisor::{ColumnStats, IndexAdvisor, QueryPattern};
use crate::condition::Condition;
use crate::config::{IndexManagerConfig, StatisticsConfig, TriggerConfig};
use crate::error::{Error, Result};
use crate::index::bitmap::{encoding::Encoding, BitmapIndex};
use crate::index::btree::BTreeIndex;
use crate::index::composite::CompositeIndex;
use crate::index::gist::regex_strategy::RegexStrategy;
use crate::index::gist::trigram::TrigramStrategy;
use crate::index::gist::GistIndex;
use crate::index::hash::HashIndex;
use crate::index::partial::PartialIndex;
use crate::index::rtree::RTreeIndex;
use crate::index::{IndexHandle, IndexKind, IndexMetadata, Key, Properties};
use crate::metrics::MetricsSink;
use crate::row::{Rid, Row};
use crate::stats::store::StatisticsStore;
use crate::stats::{IndexMaintenanceStats, IndexStats, IndexUsageStats};
use crate::trends::TrendAnalyzer;
use crate::triggers::{apply_action, MaintenanceAction, TriggerEngine};
use crate::workers::{Priority, WorkerPool};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Request to create one of the five base index kinds (spec §6.1's
/// `create_index`); composite and partial indexes are created through
/// their own dedicated methods since they each need an extra argument
/// (`create_index.py`'s request dataclass collapses all of those into one
/// optional `properties` bag, which this crate keeps as the tuning-only
/// escape hatch spec §9 calls for).
#[derive(Debug, Clone)]
pub struct IndexCreationRequest {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub kind: IndexKind,
    pub unique: bool,
    pub primary: bool,
    pub properties: Properties,
}

impl IndexCreationRequest {
    pub fn new(name: impl Into<String>, table: impl Into<String>, columns: Vec<String>, kind: IndexKind) -> Self {
        IndexCreationRequest {
            name: name.into(),
            table: table.into(),
            columns,
            kind,
            unique: false,
            primary: false,
            properties: Properties::new(),
        }
    }
}

fn property_u64(props: &Properties, key: &str, default: u64) -> u64 {
    props.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}

fn property_str<'a>(props: &'a Properties, key: &str, default: &'a str) -> &'a str {
    props.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

fn parse_encoding(s: &str) -> Encoding {
    match s {
        "wah" => Encoding::Wah,
        "concise" => Encoding::Concise,
        "roaring" => Encoding::Roaring,
        _ => Encoding::Uncompressed,
    }
}

/// Builds the concrete index behind one of the five base kinds plus
/// composite; `Partial` is rejected here since it needs a `Condition` the
/// basic request doesn't carry (use `create_partial_index`).
fn build_handle(meta: IndexMetadata, properties: &Properties) -> Result<Box<dyn IndexHandle>> {
    match meta.kind {
        IndexKind::BTree => {
            let order = property_u64(properties, "order", 32) as usize;
            Ok(Box::new(BTreeIndex::new(meta, order)))
        }
        IndexKind::Hash => {
            let buckets = property_u64(properties, "bucket_count", 64) as usize;
            Ok(Box::new(HashIndex::new(meta, buckets)))
        }
        IndexKind::Bitmap => {
            let encoding = parse_encoding(property_str(properties, "encoding", "uncompressed"));
            let max_distinct = properties.get("max_distinct_values").and_then(|v| v.as_u64()).map(|v| v as usize);
            Ok(Box::new(BitmapIndex::new(meta, encoding, max_distinct)))
        }
        IndexKind::RTree => {
            let fanout = property_u64(properties, "fanout", 8) as usize;
            Ok(Box::new(RTreeIndex::new(meta, fanout)))
        }
        IndexKind::Gist => {
            let fanout = property_u64(properties, "fanout", 8) as usize;
            match property_str(properties, "strategy", "trigram") {
                "regex" => Ok(Box::new(GistIndex::new(meta, RegexStrategy, fanout))),
                _ => Ok(Box::new(GistIndex::new(meta, TrigramStrategy, fanout))),
            }
        }
        IndexKind::Composite => {
            let inner_kind_name = property_str(properties, "inner_kind", "btree");
            let inner_kind = match inner_kind_name {
                "hash" => IndexKind::Hash,
                "bitmap" => IndexKind::Bitmap,
                _ => IndexKind::BTree,
            };
            let inner_meta = IndexMetadata::new(format!("{}__inner", meta.name), meta.table.clone(), meta.columns.clone(), inner_kind);
            let inner = build_handle(inner_meta, properties)?;
            Ok(Box::new(CompositeIndex::new(meta, inner)))
        }
        IndexKind::Partial => Err(Error::unsupported(&meta.name, "use create_partial_index for partial indexes")),
    }
}

/// Classification of an index's health, surfaced by `IndexManager::health`
/// (spec §7: "the manager exposes a `health` snapshot").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexHealth {
    Healthy,
    Degraded,
    Critical,
    NeedsMaintenance,
}

type Handle = Arc<RwLock<Box<dyn IndexHandle>>>;

/// Owns every registered index plus the statistics/trigger/advisor/worker
/// machinery around it (spec §4.8). One instance per engine; cheap to
/// share behind an `Arc` since every mutable access already goes through
/// its own internal locking.
pub struct IndexManager {
    config: IndexManagerConfig,
    indexes: RwLock<HashMap<String, Handle>>,
    live_usage: Arc<RwLock<HashMap<String, IndexUsageStats>>>,
    live_maintenance: Arc<RwLock<HashMap<String, IndexMaintenanceStats>>>,
    stats: StatisticsStore,
    triggers: TriggerEngine,
    advisor: Option<Mutex<IndexAdvisor>>,
    workers: WorkerPool,
    metrics: Arc<dyn MetricsSink>,
}

impl IndexManager {
    pub fn new(config: IndexManagerConfig, trigger_config: TriggerConfig, stats_config: StatisticsConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let advisor = config.enable_advisor.then(|| Mutex::new(IndexAdvisor::new()));
        IndexManager {
            workers: WorkerPool::new(config.max_workers),
            indexes: RwLock::new(HashMap::new()),
            live_usage: Arc::new(RwLock::new(HashMap::new())),
            live_maintenance: Arc::new(RwLock::new(HashMap::new())),
            stats: StatisticsStore::new(stats_config),
            triggers: TriggerEngine::new(trigger_config),
            advisor,
            metrics,
            config,
        }
    }

    /// `create_index(name, table, columns, kind, ...) -> Index` (spec §6.1).
    pub fn create_index(&self, req: IndexCreationRequest) -> Result<IndexMetadata> {
        {
            let indexes = self.indexes.read();
            if indexes.contains_key(&req.name) {
                return Err(Error::already_exists(&req.name));
            }
        }
        let mut meta = IndexMetadata::new(req.name.clone(), req.table.clone(), req.columns.clone(), req.kind);
        meta.unique = req.unique;
        meta.primary = req.primary;
        meta.properties = req.properties.clone();
        let handle = build_handle(meta.clone(), &req.properties)?;

        self.indexes.write().insert(req.name.clone(), Arc::new(RwLock::new(handle)));
        info!(index = %req.name, kind = ?req.kind, "created index");
        self.metrics.counter(&format!("index.{}.entries", req.name), 0);

        if let Some(advisor) = &self.advisor {
            advisor.lock().register_existing_index(meta.clone());
        }
        self.collect_stats(&req.name, Utc::now());
        Ok(meta)
    }

    /// Creates a partial index wrapping a freshly built base index of
    /// `base_kind` (spec §4.7), mirroring `manager.py`'s
    /// `create_partial_index`.
    pub fn create_partial_index(&self, name: impl Into<String>, table: impl Into<String>, columns: Vec<String>, condition: Condition, base_kind: IndexKind, properties: Properties) -> Result<IndexMetadata> {
        let name = name.into();
        let table = table.into();
        {
            let indexes = self.indexes.read();
            if indexes.contains_key(&name) {
                return Err(Error::already_exists(&name));
            }
        }
        let inner_meta = IndexMetadata::new(format!("{name}__inner"), table.clone(), columns.clone(), base_kind);
        let inner = build_handle(inner_meta, &properties)?;
        let outer_meta = IndexMetadata::new(name.clone(), table.clone(), columns, IndexKind::Partial);
        let handle: Box<dyn IndexHandle> = Box::new(PartialIndex::new(outer_meta, inner, condition));
        let meta = handle.metadata().clone();

        self.indexes.write().insert(name.clone(), Arc::new(RwLock::new(handle)));
        info!(index = %name, "created partial index");
        self.collect_stats(&name, Utc::now());
        Ok(meta)
    }

    /// `drop_index(name) -> bool` (spec §6.1). Idempotent: dropping twice
    /// returns `false` the second time rather than erroring.
    pub fn drop_index(&self, name: &str) -> bool {
        let removed = self.indexes.write().remove(name).is_some();
        if removed {
            self.live_usage.write().remove(name);
            self.live_maintenance.write().remove(name);
            info!(index = %name, "dropped index");
        }
        removed
    }

    /// `get_index(name) -> Index?` (spec §6.1), returning metadata since a
    /// trait object behind a lock can't be handed out by value.
    pub fn get_index(&self, name: &str) -> Option<IndexMetadata> {
        self.indexes.read().get(name).map(|h| h.read().metadata().clone())
    }

    /// `list_indexes(table?) -> [IndexMetadata]` (spec §6.1).
    pub fn list_indexes(&self, table: Option<&str>) -> Vec<IndexMetadata> {
        self.indexes
            .read()
            .values()
            .map(|h| h.read().metadata().clone())
            .filter(|m| table.map_or(true, |t| m.table == t))
            .collect()
    }

    /// Runs `f` against an index's current handle with a read lock held.
    pub fn with_index<R>(&self, name: &str, f: impl FnOnce(&dyn IndexHandle) -> R) -> Option<R> {
        let handle = self.indexes.read().get(name).cloned()?;
        let guard = handle.read();
        Some(f(&**guard))
    }

    /// Runs `f` against an index's current handle with a write lock held.
    pub fn with_index_mut<R>(&self, name: &str, f: impl FnOnce(&mut dyn IndexHandle) -> R) -> Option<R> {
        let handle = self.indexes.read().get(name).cloned()?;
        let mut guard = handle.write();
        Some(f(&mut **guard))
    }

    fn record_read(&self, name: &str, elapsed_ms: f64, now: DateTime<Utc>, hit: bool) {
        let mut usage = self.live_usage.write();
        let entry = usage.entry(name.to_string()).or_default();
        entry.record_read(elapsed_ms, now);
        if hit {
            entry.record_cache_hit();
        } else {
            entry.record_cache_miss();
        }
    }

    fn record_write(&self, name: &str, elapsed_ms: f64, now: DateTime<Utc>) {
        self.live_usage.write().entry(name.to_string()).or_default().record_write(elapsed_ms, now);
    }

    fn record_error(&self, name: &str) {
        self.live_maintenance.write().entry(name.to_string()).or_default().error_count += 1;
    }

    /// Inserts one row into every index registered on `table` (spec §4.8's
    /// dispatch). Returns the names of indexes whose insert failed; the
    /// base-row operation is considered "partially succeeded" when this is
    /// non-empty, matching the manager's documented failure semantics —
    /// one index failing does not stop the others from being updated.
    pub fn insert_row(&self, table: &str, row: &Row) -> Vec<String> {
        let targets: Vec<(String, Handle)> = self
            .indexes
            .read()
            .iter()
            .filter(|(_, h)| h.read().metadata().table == table)
            .map(|(n, h)| (n.clone(), Arc::clone(h)))
            .collect();

        let mut failed = Vec::new();
        for (name, handle) in targets {
            let key = {
                let guard = handle.read();
                project_key(guard.metadata(), row)
            };
            let t0 = Instant::now();
            let result = match key {
                Some(key) => handle.write().insert_with_row(key, row.rid, row),
                None => Ok(()),
            };
            let elapsed = t0.elapsed().as_secs_f64() * 1000.0;
            match result {
                Ok(()) => self.record_write(&name, elapsed, Utc::now()),
                Err(e) => {
                    error!(index = %name, error = %e, "insert failed");
                    self.record_error(&name);
                    failed.push(name);
                }
            }
        }
        failed
    }

    /// Deletes one row from every index registered on `table`. Same
    /// partial-success contract as `insert_row`.
    pub fn delete_row(&self, table: &str, rid: Rid, row: &Row) -> Vec<String> {
        let targets: Vec<(String, Handle)> = self
            .indexes
            .read()
            .iter()
            .filter(|(_, h)| h.read().metadata().table == table)
            .map(|(n, h)| (n.clone(), Arc::clone(h)))
            .collect();

        let mut failed = Vec::new();
        for (name, handle) in targets {
            let key = {
                let guard = handle.read();
                project_key(guard.metadata(), row)
            };
            let Some(key) = key else { continue };
            let t0 = Instant::now();
            let result = handle.write().delete(&key, rid);
            let elapsed = t0.elapsed().as_secs_f64() * 1000.0;
            match result {
                Ok(()) => self.record_write(&name, elapsed, Utc::now()),
                Err(e) => {
                    error!(index = %name, error = %e, "delete failed");
                    self.record_error(&name);
                    failed.push(name);
                }
            }
        }
        failed
    }

    /// Point lookup against a single named index, folding the elapsed time
    /// into its usage stats.
    pub fn search(&self, name: &str, key: &Key) -> Result<Vec<Rid>> {
        let handle = self.indexes.read().get(name).cloned().ok_or_else(|| Error::not_found(name))?;
        let t0 = Instant::now();
        let result = handle.read().search(key);
        let elapsed = t0.elapsed().as_secs_f64() * 1000.0;
        self.record_read(name, elapsed, Utc::now(), result.as_ref().map(|r| !r.is_empty()).unwrap_or(false));
        result
    }

    /// `rebuild_index(name) -> bool` (spec §6.1). A failed rebuild leaves
    /// the prior structure intact (§4.8, §7) since `IndexHandle::rebuild`
    /// implementations mutate in place only on success paths.
    pub fn rebuild_index(&self, name: &str) -> bool {
        let handle = match self.indexes.read().get(name).cloned() {
            Some(h) => h,
            None => return false,
        };
        let result = self.workers.install(|| handle.write().rebuild());
        match result {
            Ok(()) => {
                self.live_maintenance.write().entry(name.to_string()).or_default().rebuild_count += 1;
                self.live_maintenance.write().entry(name.to_string()).or_default().last_reindex = Some(Utc::now());
                info!(index = %name, "rebuilt index");
                true
            }
            Err(e) => {
                warn!(index = %name, error = %e, "rebuild failed");
                self.record_error(name);
                false
            }
        }
    }

    /// Reads size/usage from the index and persists a statistics record
    /// (spec §4.8's "statistics collection"). Called after every create and
    /// from the maintenance tick.
    pub fn collect_stats(&self, name: &str, now: DateTime<Utc>) {
        let handle = match self.indexes.read().get(name).cloned() {
            Some(h) => h,
            None => return,
        };
        let guard = handle.read();
        let meta = guard.metadata().clone();
        let mut stats = IndexStats::new(&meta.name, &meta.table, meta.kind.to_string(), meta.created_at);
        stats.size.total_entries = guard.len() as u64;
        stats.size.depth = guard.depth() as u64;
        stats.size.size_bytes = guard.size_bytes_estimate() as u64;
        stats.size.fragmentation_ratio = guard.fragmentation_ratio();
        if let Some(cs) = guard.condition_snapshot() {
            stats.condition = Some(crate::stats::IndexConditionStats {
                condition_string: cs.condition_string,
                selectivity: cs.selectivity,
                false_positive_rate: cs.false_positive_rate,
                evaluation_time_ms: cs.evaluation_time_ms,
                last_optimized: None,
            });
        }
        drop(guard);

        if let Some(usage) = self.live_usage.read().get(name) {
            stats.usage = usage.clone();
        }
        if let Some(maint) = self.live_maintenance.read().get(name) {
            stats.maintenance = maint.clone();
        }

        self.metrics.gauge(&format!("index.{name}.entries"), stats.size.total_entries as f64);
        self.metrics.gauge(&format!("index.{name}.size_bytes"), stats.size.size_bytes as f64);
        self.stats.save_stats(stats, now);
    }

    /// `analyze_index_usage(table) -> {recommendations}` (spec §6.1),
    /// requiring the advisor to be enabled.
    pub fn analyze_index_usage(&self, table: &str) -> Result<Vec<String>> {
        let advisor = self.advisor.as_ref().ok_or_else(|| Error::unsupported(table, "index advisor is not enabled"))?;
        Ok(advisor.lock().analyze_workload().remove(table).unwrap_or_default())
    }

    /// Feeds one observed query pattern and column stats into the advisor,
    /// so `analyze_index_usage`/`optimize_indexes` have something to work
    /// from (`advisor.py`'s workload tracking is fed this way by the rest
    /// of the storage engine, outside this crate's scope).
    pub fn record_query_pattern(&self, pattern: QueryPattern, column_stats: Option<(&str, ColumnStats)>) {
        if let Some(advisor) = &self.advisor {
            let mut advisor = advisor.lock();
            if let Some((column, stats)) = column_stats {
                advisor.record_column_stats(&pattern.table_name, column, stats);
            }
            advisor.record_query_pattern(pattern);
        }
    }

    /// `get_index_statistics(name) -> IndexStats?` (spec §6.1).
    pub fn get_index_statistics(&self, name: &str) -> Option<IndexStats> {
        self.stats.latest_stats(name)
    }

    /// A trend analyzer bound to this manager's statistics history, for the
    /// performance/growth/condition-effectiveness reports spec §2 lists as a
    /// standalone component.
    pub fn trend_analyzer(&self) -> TrendAnalyzer<'_> {
        TrendAnalyzer::new(&self.stats)
    }

    /// `optimize_indexes(table) -> [applied_changes]` (spec §6.1):
    /// recommends missing indexes from recorded query patterns and creates
    /// them, reporting what it actually applied. Unlike `manager.py`'s
    /// version, this never drops or rebuilds as part of optimization — that
    /// is the trigger engine's job (`run_maintenance_tick` below); this
    /// method only covers the advisor's "create" recommendations.
    pub fn optimize_indexes(&self, table: &str) -> Result<Vec<String>> {
        let advisor = self.advisor.as_ref().ok_or_else(|| Error::unsupported(table, "index advisor is not enabled"))?;
        let recommendations = advisor.lock().recommend_indexes(table, 5);
        let mut applied = Vec::new();
        for rec in recommendations {
            let name = format!("{table}_{}_idx", rec.columns.join("_"));
            let mut props = Properties::new();
            if rec.use_bitmap_compression {
                props.insert("encoding".into(), serde_json::Value::String("roaring".into()));
            }
            let req = IndexCreationRequest::new(name.clone(), table, rec.columns.clone(), rec.kind).properties_from(props);
            match self.create_index(req) {
                Ok(_) => applied.push(format!("created index {name}")),
                Err(e) => warn!(index = %name, error = %e, "could not apply advisor recommendation"),
            }
        }
        Ok(applied)
    }

    /// One pass of the background maintenance loop (spec §4.8's "runs on a
    /// background thread at a configured interval"): collects fresh stats
    /// for every index, checks the trigger engine, and dispatches whatever
    /// actions fired onto the worker pool, recovery actions (rebuilds from
    /// a corruption-driven `Maintenance` state) ahead of routine ones.
    pub fn run_maintenance_tick(&self, now: DateTime<Utc>) {
        let names: Vec<String> = self.indexes.read().keys().cloned().collect();
        for name in &names {
            self.collect_stats(name, now);
        }
        for name in &names {
            let events = self.triggers.check(&self.stats, name, now);
            if events.is_empty() {
                continue;
            }
            self.triggers.record_events(&events);
            for event in events {
                let index_name = name.clone();
                let indexes = &self.indexes;
                let priority = if event.action == MaintenanceAction::Rebuild { Priority::Recovery } else { Priority::Normal };
                let handle = match indexes.read().get(&index_name).cloned() {
                    Some(h) => h,
                    None => continue,
                };
                let live_maintenance = Arc::clone(&self.live_maintenance);
                self.workers.submit(priority, move || {
                    apply_action(event.action, |action| run_maintenance_action(action, &handle));
                    live_maintenance.write().entry(index_name.clone()).or_default().last_analyze = Some(now);
                });
            }
        }
    }

    /// Health classification per index (spec §7).
    pub fn health(&self, name: &str) -> Option<IndexHealth> {
        let stats = self.stats.latest_stats(name)?;
        let maintenance_state = self.live_maintenance.read().get(name).map(|m| m.error_count).unwrap_or(0);
        Some(if maintenance_state > 10 {
            IndexHealth::Critical
        } else if stats.size.fragmentation_ratio > self.config_trigger_fragmentation() {
            IndexHealth::Degraded
        } else if stats.needs_optimization() {
            IndexHealth::NeedsMaintenance
        } else {
            IndexHealth::Healthy
        })
    }

    fn config_trigger_fragmentation(&self) -> f64 {
        0.3
    }

    pub fn current_num_workers(&self) -> usize {
        self.workers.current_num_threads()
    }
}

impl IndexCreationRequest {
    fn properties_from(mut self, props: Properties) -> Self {
        self.properties.extend(props);
        self
    }
}

/// Projects a row onto an index's declared columns, returning `None` when
/// the row doesn't carry one of them (a missing column excludes the row
/// from the index the same way a failed partial condition would, spec
/// §3.3's "any missing referenced column yields false").
fn project_key(meta: &IndexMetadata, row: &Row) -> Option<Key> {
    if meta.columns.len() == 1 {
        row.get(&meta.columns[0]).map(crate::index::key_from_scalar)
    } else {
        let mut parts = Vec::with_capacity(meta.columns.len());
        for col in &meta.columns {
            parts.push(crate::index::key_from_scalar(row.get(col)?));
        }
        Some(Key::Tuple(parts))
    }
}

fn run_maintenance_action(action: MaintenanceAction, handle: &Handle) -> Result<()> {
    match action {
        MaintenanceAction::Rebuild | MaintenanceAction::CompactOrPartition => handle.write().rebuild(),
        MaintenanceAction::Analyze | MaintenanceAction::AnalyzeAndReplan | MaintenanceAction::AdjustCacheSizing | MaintenanceAction::ReoptimizeCondition => Ok(()),
    }
}

#[cfg(test)]
mod manager_test;
