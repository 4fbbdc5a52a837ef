//! Batch Trigger Module
//!
//! Decides when the open batch is committed:
//! - Size trigger: the batch reached the configured size
//! - Time trigger: the flush timer fired, whatever the batch holds
//!
//! Both are evaluated by the persister loop itself, so at most one commit is
//! ever in flight.

use crate::config::PersisterConfig;
use std::fmt;
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};

/// Why a batch is being committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    Size,
    Timer,
    Shutdown,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushReason::Size => write!(f, "size"),
            FlushReason::Timer => write!(f, "timer"),
            FlushReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Size threshold and timer period for committing batches
#[derive(Debug, Clone, Copy)]
pub struct FlushTrigger {
    max_batch_size: usize,
    interval: Duration,
}

impl FlushTrigger {
    pub fn new(max_batch_size: usize, interval: Duration) -> Self {
        Self {
            max_batch_size,
            interval,
        }
    }

    pub fn from_config(config: &PersisterConfig) -> Self {
        Self::new(config.batch_size, config.flush_interval())
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Size trigger, checked after every append
    pub fn size_reached(&self, batch_len: usize) -> bool {
        batch_len >= self.max_batch_size
    }

    /// Flush timer. The first tick fires one full period after creation;
    /// ticks missed during a slow commit are delayed, not bunched.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
