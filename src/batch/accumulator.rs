//! Batch Accumulator Module
//!
//! Holds the open batch of pending write operations. Only the persister task
//! owns an accumulator; `Batch` values cannot be built or grown outside this
//! module, so a sealed batch is never touched by anyone but its committer.

use crate::mapper::WriteOperation;

/// Sealed, ordered group of operations committed in one transaction
#[derive(Debug)]
pub struct Batch {
    /// Sequential id, starting at 1, used in logs
    id: u64,
    operations: Vec<WriteOperation>,
}

impl Batch {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub(super) fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }
}

/// Open batch plus the id counter for sealed batches
pub(super) struct BatchAccumulator {
    capacity: usize,
    next_batch_id: u64,
    open: Vec<WriteOperation>,
}

impl BatchAccumulator {
    /// # Arguments
    /// * `capacity` - Batch size bound, used to preallocate the open batch
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_batch_id: 1,
            open: Vec::with_capacity(capacity),
        }
    }

    /// Append an operation to the open batch
    ///
    /// # Returns
    /// The length of the open batch after the append
    pub fn push(&mut self, operation: WriteOperation) -> usize {
        self.open.push(operation);
        self.open.len()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Seal the open batch and start a new one
    ///
    /// # Returns
    /// * `Some(Batch)` with the pending operations in arrival order
    /// * `None` if nothing is pending (no id is consumed)
    pub fn seal(&mut self) -> Option<Batch> {
        if self.open.is_empty() {
            return None;
        }

        let operations = std::mem::replace(&mut self.open, Vec::with_capacity(self.capacity));
        let batch = Batch {
            id: self.next_batch_id,
            operations,
        };
        self.next_batch_id += 1;
        Some(batch)
    }

    /// Build a batch directly, for executor tests
    #[cfg(test)]
    pub fn batch_of(id: u64, operations: Vec<WriteOperation>) -> Batch {
        Batch { id, operations }
    }
}
