//! In-memory store used by the unit tests.
//!
//! Rows are keyed by (table, identity). Upserts create or replace a row,
//! updates only touch existing rows, inserts always append. Operations run
//! against a staged copy and only reach the shared state on commit.

use super::{Store, StoreTransaction};
use crate::{
    StoreError,
    mapper::{StatementKind, WriteOperation},
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<(&'static str, String), WriteOperation>,
    appended: Vec<WriteOperation>,
}

impl Tables {
    fn apply(&mut self, operation: &WriteOperation) -> u64 {
        let statement = operation.statement();
        let key = (statement.table(), operation.identity().unwrap_or_default().to_string());
        match statement.kind() {
            StatementKind::Upsert => {
                self.rows.insert(key, operation.clone());
                1
            }
            StatementKind::Update => u64::from(self.rows.contains_key(&key)),
            StatementKind::Insert => {
                self.appended.push(operation.clone());
                1
            }
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    committed: Vec<Vec<WriteOperation>>,
    begins: usize,
    rollbacks: usize,
    schema_initialized: bool,
    closed: bool,
    fail_ping: bool,
    failing_commits: usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_ping() -> Self {
        let store = Self::new();
        store.lock().fail_ping = true;
        store
    }

    /// Make the next `count` transactions fail on their first result
    pub fn fail_next_commits(&self, count: usize) {
        self.lock().failing_commits = count;
    }

    /// Operation lists of every committed transaction, in commit order
    pub fn commits(&self) -> Vec<Vec<WriteOperation>> {
        self.lock().committed.clone()
    }

    pub fn committed_operations(&self) -> Vec<WriteOperation> {
        self.lock().committed.iter().flatten().cloned().collect()
    }

    pub fn row_count(&self, table: &str, identity: &str) -> usize {
        self.lock()
            .tables
            .rows
            .keys()
            .filter(|(t, id)| *t == table && id == identity)
            .count()
    }

    pub fn appended_count(&self, table: &str) -> usize {
        self.lock()
            .tables
            .appended
            .iter()
            .filter(|op| op.statement().table() == table)
            .count()
    }

    pub fn begins(&self) -> usize {
        self.lock().begins
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    pub fn schema_initialized(&self) -> bool {
        self.lock().schema_initialized
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Store for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn ping(&self) -> Result<(), StoreError> {
        if self.lock().fail_ping {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.lock().schema_initialized = true;
        Ok(())
    }

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        let mut inner = self.lock();
        inner.begins += 1;
        let fail = inner.failing_commits > 0;
        if fail {
            inner.failing_commits -= 1;
        }
        Ok(MemoryTransaction {
            store: self.clone(),
            pending: VecDeque::new(),
            executed: Vec::new(),
            fail,
        })
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}

pub struct MemoryTransaction {
    store: MemoryStore,
    pending: VecDeque<WriteOperation>,
    executed: Vec<WriteOperation>,
    fail: bool,
}

impl StoreTransaction for MemoryTransaction {
    fn submit(&mut self, operations: Vec<WriteOperation>) {
        self.pending.extend(operations);
    }

    async fn next_result(&mut self) -> Result<Option<u64>, StoreError> {
        let Some(operation) = self.pending.pop_front() else {
            return Ok(None);
        };
        if self.fail {
            return Err(StoreError::Statement {
                statement: operation.statement().name(),
                reason: "injected failure".to_string(),
            });
        }
        self.executed.push(operation);
        Ok(Some(1))
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut inner = self.store.lock();
        for operation in &self.executed {
            inner.tables.apply(operation);
        }
        inner.committed.push(self.executed);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.store.lock().rollbacks += 1;
        Ok(())
    }
}
