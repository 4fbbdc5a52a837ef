//! Batch Persistence Module
//!
//! This module handles batching and committing of write operations:
//! - Accumulator: holds the open batch and seals it into `Batch` values
//! - Trigger: decides when a batch is committed (size or timer)
//! - Executor: commits a sealed batch in one transaction
//! - Persister: the background task tying them together

mod accumulator;
mod trigger;
mod executor;
mod persister;


pub use accumulator::Batch;
pub use trigger::{FlushReason, FlushTrigger};
pub use executor::{commit, CommitReport};
pub use persister::Persister;
