//! Error types for the persistence tier.
//!
//! `StoreError` is what a store backend reports; `PersistError` is what the
//! client and the persister surface to callers and logs.

use thiserror::Error;

/// Failure reported by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("statement {statement} failed: {reason}")]
    Statement {
        statement: &'static str,
        reason: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::DbClient`] and the persister task
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("empty db-endpoint provided")]
    EmptyEndpoint,

    #[error("invalid persister configuration: {0}")]
    InvalidConfig(String),

    #[error("unable to connect to the database")]
    Connect(#[source] StoreError),

    #[error("unable to ping db")]
    Ping(#[source] StoreError),

    #[error("unable to initialize the SQL tables")]
    Schema(#[source] StoreError),

    #[error("unable to persist batch #{batch_id}: error on operation {executed} of {attempted}")]
    Commit {
        batch_id: u64,
        attempted: usize,
        executed: usize,
        #[source]
        source: StoreError,
    },

    #[error("persister is shutting down, record rejected")]
    Closed,
}
