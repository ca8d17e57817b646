//! Bounded maintenance worker pool (spec §5, §6.3 `max_workers`), grounded
//! on `original_source`'s `manager.py` use of a `ThreadPoolExecutor` for
//! statistics collection and maintenance dispatch. `rayon::ThreadPool` is
//! already an unused `rdms` dependency; this finishes wiring it in.
//!
//! Tasks are queued FIFO except that a `Recovery`-priority task is always
//! drained before any `Normal` one ahead of it in the queue (spec §5:
//! "queued FIFO with a priority override for recovery operations").

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Normal,
    Recovery,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Entry {
    priority: Priority,
    job: Job,
}

#[derive(Default)]
struct Queue {
    normal: VecDeque<Entry>,
    recovery: VecDeque<Entry>,
}

impl Queue {
    fn pop(&mut self) -> Option<Entry> {
        self.recovery.pop_front().or_else(|| self.normal.pop_front())
    }

    fn push(&mut self, entry: Entry) {
        match entry.priority {
            Priority::Recovery => self.recovery.push_back(entry),
            Priority::Normal => self.normal.push_back(entry),
        }
    }
}

/// A bounded pool of `max_workers` rayon threads draining a shared FIFO
/// queue with a recovery-priority lane. `submit` never blocks the caller;
/// jobs run as rayon threads become free.
pub struct WorkerPool {
    pool: ThreadPool,
    queue: Arc<Mutex<Queue>>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_workers.max(1))
            .build()
            .expect("rayon thread pool construction");
        WorkerPool {
            pool,
            queue: Arc::new(Mutex::new(Queue::default())),
        }
    }

    /// Enqueues `job` at the given priority and dispatches a worker to
    /// drain the queue. Submission itself never blocks.
    pub fn submit<F>(&self, priority: Priority, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut q = self.queue.lock();
            q.push(Entry { priority, job: Box::new(job) });
        }

        let queue = Arc::clone(&self.queue);
        self.pool.spawn(move || {
            let next = {
                let mut q = queue.lock();
                q.pop()
            };
            if let Some(entry) = next {
                (entry.job)();
            }
        });
    }

    /// Runs `job` on the pool and blocks the caller for the result, used
    /// by paths (e.g. `rebuild_index`) that need a synchronous answer.
    pub fn install<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(job)
    }

    pub fn current_num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Runs `action`, logging and swallowing any error so a failed maintenance
/// task never takes down the worker pool (spec §4.10: "failures increment
/// error_count but do not propagate").
pub fn run_fallible(label: &str, action: impl FnOnce() -> crate::Result<()>) {
    if let Err(e) = action() {
        warn!(task = label, error = %e, "maintenance task failed");
    }
}

#[cfg(test)]
mod workers_test;
