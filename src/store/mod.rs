//! Store Module
//!
//! Contract the persister needs from the relational store, and the
//! PostgreSQL implementation of it.
//!
//! A store must support:
//! - parameterized statement execution
//! - grouping several statements into one transaction
//! - upserts keyed by a natural identity (peer id, node id, IP address)
//! - a "no more results" signal, distinct from an error, when iterating
//!   the results of a grouped execution

use crate::{StoreError, mapper::WriteOperation};
use std::future::Future;

pub mod postgres;
#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

/// Connection pool owner
pub trait Store: Send + Sync + 'static {
    type Transaction: StoreTransaction;

    /// Liveness check
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create the persisted tables if they do not exist yet
    fn init_schema(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Open a transaction
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, StoreError>> + Send;

    /// Release every pooled connection
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// An open transaction able to run a group of statements
pub trait StoreTransaction: Send + Sized {
    /// Queue a group of operations for execution
    fn submit(&mut self, operations: Vec<WriteOperation>);

    /// Result of the next submitted operation
    ///
    /// # Returns
    /// * `Ok(Some(rows))` - the operation ran, `rows` is the affected row count
    /// * `Ok(None)` - no more results; every submitted operation was consumed
    /// * `Err` - the operation failed, the transaction must be rolled back
    fn next_result(&mut self) -> impl Future<Output = Result<Option<u64>, StoreError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
