use std::fmt;
use tokio::sync::watch;

/// Lifecycle of the persister task
///
/// Transitions only move forward: `Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PersisterState {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for PersisterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersisterState::Running => write!(f, "running"),
            PersisterState::Draining => write!(f, "draining"),
            PersisterState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Writer side of the lifecycle, held by the persister task
pub struct Lifecycle {
    tx: watch::Sender<PersisterState>,
}

impl Lifecycle {
    pub fn new() -> (Self, watch::Receiver<PersisterState>) {
        let (tx, rx) = watch::channel(PersisterState::Running);
        (Self { tx }, rx)
    }

    pub fn current(&self) -> PersisterState {
        *self.tx.borrow()
    }

    /// Move to `next` if it lies ahead of the current state
    ///
    /// # Returns
    /// `true` if the state changed
    pub fn advance(&self, next: PersisterState) -> bool {
        self.tx.send_if_modified(|state| {
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}
