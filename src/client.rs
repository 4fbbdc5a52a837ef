//! Database Client Module
//!
//! `DbClient` is what crawler components talk to. It validates the store at
//! construction, spawns the persister task and hands out queue senders.
//! Persistence is fire-and-forget: enqueueing never reports whether the
//! record was eventually committed.
//!
//! # Shutdown order
//! `close()` signals the persister, waits until it reports `Stopped` (queue
//! drained, last batch committed), closes the connection pool and finally
//! drops the queue sender.

use crate::{
    PersistError, Record,
    batch::Persister,
    config::Config,
    queue::{self, IngestSender},
    state::{Lifecycle, PersisterState, PersisterStats, StatsSnapshot},
    store::{PgStore, Store},
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

pub struct DbClient<S: Store = PgStore> {
    store: Arc<S>,
    sender: IngestSender,
    /// Child of the caller's token: cancelled by either side
    shutdown: CancellationToken,
    state: watch::Receiver<PersisterState>,
    stats: Arc<PersisterStats>,
    worker: JoinHandle<()>,
}

impl DbClient<PgStore> {
    /// Connect to PostgreSQL and start the persister
    ///
    /// # Arguments
    /// * `config` - Database and persister settings
    /// * `cancel` - Upstream cancellation; cancelling it shuts the persister down
    ///
    /// # Returns
    /// * `Err(EmptyEndpoint)` if no connection string was configured
    /// * `Err(Connect)` / `Err(Ping)` if the database is unreachable
    /// * `Err(Schema)` if table initialization was requested and failed
    pub async fn connect(config: &Config, cancel: CancellationToken) -> Result<Self, PersistError> {
        if config.database.url.trim().is_empty() {
            return Err(PersistError::EmptyEndpoint);
        }
        config.persister.validate()?;

        let store = PgStore::connect(&config.database)
            .await
            .map_err(PersistError::Connect)?;
        Self::with_store(store, config, cancel).await
    }
}

impl<S: Store> DbClient<S> {
    /// Start the persister on an already opened store
    ///
    /// Pings the store and, if configured, initializes the schema before
    /// spawning anything. On error no task is left running.
    pub async fn with_store(
        store: S,
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Self, PersistError> {
        config.persister.validate()?;

        store.ping().await.map_err(PersistError::Ping)?;
        if config.database.init_schema {
            store.init_schema().await.map_err(PersistError::Schema)?;
        }

        let store = Arc::new(store);
        let shutdown = cancel.child_token();
        let stats = Arc::new(PersisterStats::new());
        let (lifecycle, state) = Lifecycle::new();
        let (sender, receiver) = queue::channel(config.persister.queue_capacity(), shutdown.clone());

        let persister = Persister::new(store.clone(), &config.persister, stats.clone(), lifecycle);
        let worker = tokio::spawn(
            persister
                .run(receiver, shutdown.clone())
                .instrument(info_span!("db-persister")),
        );

        Ok(Self {
            store,
            sender,
            shutdown,
            state,
            stats,
            worker,
        })
    }

    /// Enqueue a record, waiting while the queue is full
    ///
    /// Fails with `PersistError::Closed` once shutdown has begun.
    pub async fn persist(&self, record: impl Into<Record>) -> Result<(), PersistError> {
        self.sender.persist(record.into()).await
    }

    /// A sender for a producer running on its own task
    pub fn sender(&self) -> IngestSender {
        self.sender.clone()
    }

    pub fn state(&self) -> PersisterState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shut down: drain, final commit, release the pool, close the queue
    pub async fn close(self) -> StatsSnapshot {
        self.shutdown.cancel();

        if let Err(e) = self.worker.await {
            error!("persister task ended abnormally: {}", e);
        }

        // may block while connections are still checked out
        self.store.close().await;
        drop(self.sender);

        let stats = self.stats.snapshot();
        info!(
            "db client closed: {} batches committed, {} failed, {} operations executed",
            stats.batches_committed, stats.batches_failed, stats.operations_executed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures::*, store::memory::MemoryStore};
    use std::time::Duration;

    fn config() -> Config {
        let mut config = Config::default();
        config.database.init_schema = true;
        config
    }

    #[tokio::test]
    async fn test_empty_endpoint_fails_fast() {
        let mut config = config();
        config.database.url = "  ".to_string();

        let result = DbClient::connect(&config, CancellationToken::new()).await;

        assert!(matches!(result, Err(PersistError::EmptyEndpoint)));
    }

    #[tokio::test]
    async fn test_failed_ping_spawns_no_worker() {
        let store = MemoryStore::failing_ping();

        let result = DbClient::with_store(store.clone(), &config(), CancellationToken::new()).await;
        assert!(matches!(result, Err(PersistError::Ping(_))));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.begins(), 0);
        assert!(!store.schema_initialized());
    }

    #[tokio::test]
    async fn test_invalid_persister_config_is_rejected() {
        let mut config = config();
        config.persister.batch_size = 0;

        let result = DbClient::with_store(MemoryStore::new(), &config, CancellationToken::new()).await;

        assert!(matches!(result, Err(PersistError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_schema_initialized_on_request() {
        let store = MemoryStore::new();

        let client = DbClient::with_store(store.clone(), &config(), CancellationToken::new())
            .await
            .unwrap();
        assert!(store.schema_initialized());
        assert_eq!(client.state(), PersisterState::Running);

        client.close().await;
    }

    #[tokio::test]
    async fn test_close_drains_and_flushes_pending_batch() {
        let store = MemoryStore::new();
        let client = DbClient::with_store(store.clone(), &config(), CancellationToken::new())
            .await
            .unwrap();

        client.persist(conn_event("peer-a")).await.unwrap();
        let stats = client.close().await;

        let commits = store.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].len(), 2);
        assert_eq!(stats.operations_executed, 2);
        // the pool is released after the final commit
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_upstream_cancellation_drains_like_close() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let client = DbClient::with_store(store.clone(), &config(), cancel.clone())
            .await
            .unwrap();

        client.persist(peer_info("peer-a")).await.unwrap();
        cancel.cancel();

        let mut state = client.state.clone();
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == PersisterState::Stopped),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(store.committed_operations().len(), 1);
        assert!(matches!(
            client.persist(peer_info("peer-b")).await,
            Err(PersistError::Closed)
        ));
        client.close().await;
    }

    #[tokio::test]
    async fn test_persist_after_close_started_is_rejected() {
        let store = MemoryStore::new();
        let client = DbClient::with_store(store, &config(), CancellationToken::new())
            .await
            .unwrap();
        let sender = client.sender();

        client.close().await;

        assert!(matches!(
            sender.persist(peer_info("peer-a").into()).await,
            Err(PersistError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_upserts_keep_one_row_per_identity() {
        let store = MemoryStore::new();
        let client = DbClient::with_store(store.clone(), &config(), CancellationToken::new())
            .await
            .unwrap();

        client.persist(peer_info("peer-a")).await.unwrap();
        let mut updated = peer_info("peer-a");
        updated.client_version = "v4.6.0".to_string();
        client.persist(updated).await.unwrap();
        client.close().await;

        assert_eq!(store.committed_operations().len(), 2);
        assert_eq!(store.row_count("peer_info", "peer-a"), 1);
    }
}
