use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the persister task and read by anyone
#[derive(Debug, Default)]
pub struct PersisterStats {
    records_received: AtomicU64,
    records_unmapped: AtomicU64,
    operations_queued: AtomicU64,
    batches_committed: AtomicU64,
    batches_failed: AtomicU64,
    operations_executed: AtomicU64,
    operations_lost: AtomicU64,
}

impl PersisterStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record was dequeued and mapped to `operations` operations
    pub fn record_mapped(&self, operations: usize) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
        if operations == 0 {
            self.records_unmapped.fetch_add(1, Ordering::Relaxed);
        }
        self.operations_queued
            .fetch_add(operations as u64, Ordering::Relaxed);
    }

    pub fn batch_committed(&self, executed: usize) {
        self.batches_committed.fetch_add(1, Ordering::Relaxed);
        self.operations_executed
            .fetch_add(executed as u64, Ordering::Relaxed);
    }

    pub fn batch_failed(&self, attempted: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.operations_lost
            .fetch_add(attempted as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_unmapped: self.records_unmapped.load(Ordering::Relaxed),
            operations_queued: self.operations_queued.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            operations_executed: self.operations_executed.load(Ordering::Relaxed),
            operations_lost: self.operations_lost.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PersisterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub records_received: u64,
    /// Records that produced no operation (unrecognized variants)
    pub records_unmapped: u64,
    pub operations_queued: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    pub operations_executed: u64,
    /// Operations discarded with a failed batch
    pub operations_lost: u64,
}
