//! Transactional Executor Module
//!
//! Commits a sealed batch as one transaction: submit every operation as a
//! group, consume the results until the store reports there are no more,
//! then commit. Any error before that point rolls the transaction back and
//! the batch is lost; there is no retry.

use super::accumulator::Batch;
use crate::{
    PersistError,
    store::{Store, StoreTransaction},
};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of a successful commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub batch_id: u64,
    pub executed: usize,
    pub elapsed: Duration,
}

/// Commit a batch against the store
///
/// # Returns
/// * `Ok(CommitReport)` with the number of operations executed; an empty
///   batch returns immediately without touching the store
/// * `Err(PersistError::Commit)` if the transaction could not be opened,
///   any operation failed, or the commit itself failed
pub async fn commit<S: Store>(store: &S, batch: Batch) -> Result<CommitReport, PersistError> {
    let started = Instant::now();
    let batch_id = batch.id();
    let attempted = batch.len();

    if batch.is_empty() {
        debug!("skipping batch-query, no queries to persist");
        return Ok(CommitReport {
            batch_id,
            executed: 0,
            elapsed: started.elapsed(),
        });
    }
    debug!("persisting batch #{} of queries with len({})", batch_id, attempted);

    let fail = |executed: usize, source| PersistError::Commit {
        batch_id,
        attempted,
        executed,
        source,
    };

    let mut tx = store.begin().await.map_err(|e| fail(0, e))?;
    tx.submit(batch.into_operations());

    let mut executed = 0;
    loop {
        match tx.next_result().await {
            Ok(Some(_rows)) => {
                executed += 1;
                if executed == attempted + 1 {
                    warn!("are we stuck persisting queries? {} results out of {} queries", executed, attempted);
                }
            }
            // no more results: every operation went through
            Ok(None) => break,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback of batch #{} failed: {}", batch_id, rollback_err);
                }
                return Err(fail(executed, e));
            }
        }
    }

    tx.commit().await.map_err(|e| fail(executed, e))?;

    let elapsed = started.elapsed();
    debug!(
        "batch #{} with {} queries successfully persisted in {:?}",
        batch_id, executed, elapsed
    );
    Ok(CommitReport {
        batch_id,
        executed,
        elapsed,
    })
}
