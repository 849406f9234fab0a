use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::DrainState;

/// Point-in-time view of a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub state: DrainState,
    /// Tasks waiting for a batch.
    pub pending: usize,
    pub submitted: u64,
    pub batches_succeeded: u64,
    pub batches_failed: u64,
    pub tasks_fulfilled: u64,
    pub tasks_rejected: u64,
}

/// Lock-free counters updated by `submit` and the drain loop.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    submitted: AtomicU64,
    batches_succeeded: AtomicU64,
    batches_failed: AtomicU64,
    tasks_fulfilled: AtomicU64,
    tasks_rejected: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch_success(&self, tasks: usize) {
        self.batches_succeeded.fetch_add(1, Ordering::Relaxed);
        self.tasks_fulfilled.fetch_add(tasks as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_batch_failure(&self, tasks: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.tasks_rejected.fetch_add(tasks as u64, Ordering::Relaxed);
    }

    /// Tasks dropped without a batch because their drain loop never finished.
    pub(crate) fn record_abandoned(&self, tasks: usize) {
        self.tasks_rejected.fetch_add(tasks as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, state: DrainState, pending: usize) -> QueueStats {
        QueueStats {
            state,
            pending,
            submitted: self.submitted.load(Ordering::Relaxed),
            batches_succeeded: self.batches_succeeded.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            tasks_fulfilled: self.tasks_fulfilled.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
        }
    }
}
