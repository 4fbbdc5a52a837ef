//! Persistence tier of a peer-to-peer network crawler.
//! Crawler components enqueue records; a single background persister maps them
//! to write operations, batches them and commits each batch transactionally.

pub mod types; // Domain records produced by the crawler.
pub mod error; // Store and persister error types.
pub mod config; // Defines and loads configuration.
pub mod mapper; // Maps records to parameterized write operations.
pub mod queue; // Bounded ingestion queue between producers and the persister.
pub mod state; // Persister lifecycle state and counters.
pub mod store; // Store contract and the PostgreSQL implementation.
pub mod batch; // Batch accumulation, flush triggers, commits and the persister task.
pub mod client; // Public entry point owning the persister.

#[cfg(test)]
mod fixtures;

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use error::{PersistError, StoreError};
pub use config::Config;
pub use client::DbClient;
