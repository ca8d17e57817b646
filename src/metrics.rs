//! Metrics sink contract (spec §6.2, §9: "components take a metrics sink at
//! construction; no process-wide mutable globals").

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Receives counters and timers named `index.<name>.{reads,writes,
/// latency_ms,cache_hits,cache_misses,size_bytes,entries}`.
///
/// Implementations must be cheap to call from hot paths; the default
/// `NoopSink` and `InMemorySink` below satisfy `Send + Sync` so a single
/// instance can be shared behind an `Arc` across every index.
pub trait MetricsSink: Send + Sync {
    fn counter(&self, name: &str, value: u64);
    fn gauge(&self, name: &str, value: f64);
    fn timer_ms(&self, name: &str, millis: f64);
}

/// Discards everything. Used when no sink is configured.
#[derive(Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn counter(&self, _name: &str, _value: u64) {}
    fn gauge(&self, _name: &str, _value: f64) {}
    fn timer_ms(&self, _name: &str, _millis: f64) {}
}

/// Accumulates counters and the last-seen gauge/timer value per name; useful
/// for tests and for an embedding application that wants to poll rather than
/// push metrics onward.
#[derive(Debug, Default)]
pub struct InMemorySink {
    counters: Mutex<std::collections::HashMap<String, AtomicU64>>,
    gauges: Mutex<std::collections::HashMap<String, f64>>,
    timers: Mutex<std::collections::HashMap<String, f64>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter_value(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.gauges.lock().unwrap().get(name).copied()
    }

    pub fn timer_value(&self, name: &str) -> Option<f64> {
        self.timers.lock().unwrap().get(name).copied()
    }
}

impl MetricsSink for InMemorySink {
    fn counter(&self, name: &str, value: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    fn gauge(&self, name: &str, value: f64) {
        self.gauges.lock().unwrap().insert(name.to_string(), value);
    }

    fn timer_ms(&self, name: &str, millis: f64) {
        self.timers.lock().unwrap().insert(name.to_string(), millis);
    }
}

#[cfg(test)]
mod metrics_test;
