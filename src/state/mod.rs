//! Persister State Module
//!
//! Lifecycle state of the persister task and its throughput counters,
//! both readable from outside the task without locking.

mod lifecycle;
mod stats;

pub use lifecycle::{Lifecycle, PersisterState};
pub use stats::{PersisterStats, StatsSnapshot};
