//! Persister Module
//!
//! The single background task that turns queued records into committed
//! batches. It owns the open batch, the flush timer and the store
//! transaction; nothing else touches them.
//!
//! # Loop
//! Each iteration waits on three sources, checked in priority order:
//! 1. Shutdown (upstream cancellation or an explicit close)
//! 2. A new record from the ingestion queue
//! 3. The flush timer
//!
//! # Shutdown
//! On shutdown the task moves to `Draining`, closes the queue to new
//! records, consumes everything still buffered, commits the remaining
//! partial batch and only then reports `Stopped`.

use super::{
    accumulator::BatchAccumulator,
    executor,
    trigger::{FlushReason, FlushTrigger},
};
use crate::{
    Record,
    config::PersisterConfig,
    mapper::map_record,
    queue::IngestReceiver,
    state::{Lifecycle, PersisterState, PersisterStats},
    store::Store,
};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

pub struct Persister<S: Store> {
    store: Arc<S>,
    accumulator: BatchAccumulator,
    trigger: FlushTrigger,
    stats: Arc<PersisterStats>,
    lifecycle: Lifecycle,
}

impl<S: Store> Persister<S> {
    pub fn new(
        store: Arc<S>,
        config: &PersisterConfig,
        stats: Arc<PersisterStats>,
        lifecycle: Lifecycle,
    ) -> Self {
        let trigger = FlushTrigger::from_config(config);
        Self {
            store,
            accumulator: BatchAccumulator::new(trigger.max_batch_size()),
            trigger,
            stats,
            lifecycle,
        }
    }

    /// Run until shutdown is signalled or every producer is gone
    pub async fn run(mut self, mut queue: IngestReceiver, shutdown: CancellationToken) {
        info!(
            "persister started: batch_size={}, flush_interval={:?}",
            self.trigger.max_batch_size(),
            self.trigger.interval()
        );
        let mut ticker = self.trigger.ticker();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("shutdown detected, closing persister");
                    break;
                }
                record = queue.recv() => match record {
                    Some(record) => self.ingest(record).await,
                    None => {
                        info!("ingestion queue closed, closing persister");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    trace!("ticker jumped - flushing content of query-batch");
                    self.flush(FlushReason::Timer).await;
                }
            }
        }

        self.drain(queue).await;
    }

    /// Map a record and append its operations, committing whenever the
    /// batch reaches its size bound
    async fn ingest(&mut self, record: Record) {
        let operations = map_record(&record);
        trace!(kind = record.kind(), operations = operations.len(), "record mapped");
        self.stats.record_mapped(operations.len());

        for operation in operations {
            let len = self.accumulator.push(operation);
            if self.trigger.size_reached(len) {
                trace!("batch-query full, ready to persist");
                self.flush(FlushReason::Size).await;
            }
        }
    }

    /// Commit whatever is pending; the batch is reset whatever the outcome
    async fn flush(&mut self, reason: FlushReason) {
        let Some(batch) = self.accumulator.seal() else {
            trace!(%reason, "nothing to flush");
            return;
        };
        let attempted = batch.len();
        let started = Instant::now();

        match executor::commit(self.store.as_ref(), batch).await {
            Ok(report) => {
                self.stats.batch_committed(report.executed);
                trace!(%reason, batch_id = report.batch_id, executed = report.executed, "batch flushed");
            }
            Err(e) => {
                self.stats.batch_failed(attempted);
                error!(%reason, operations = attempted, elapsed = ?started.elapsed(), "{}", e);
            }
        }
    }

    async fn drain(mut self, mut queue: IngestReceiver) {
        self.lifecycle.advance(PersisterState::Draining);
        queue.close();

        let mut drained = 0usize;
        while let Some(record) = queue.recv().await {
            self.ingest(record).await;
            drained += 1;
        }
        info!(
            "drained {} queued records, flushing {} pending operations",
            drained,
            self.accumulator.len()
        );

        self.flush(FlushReason::Shutdown).await;
        self.lifecycle.advance(PersisterState::Stopped);
        info!("persister stopped");
    }
}
