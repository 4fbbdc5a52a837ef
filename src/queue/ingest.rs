//! Ingestion Queue Module
//!
//! Bounded FIFO between the crawler components (many producers) and the
//! persister task (single consumer). A full queue suspends the producer
//! until the persister catches up; records are never dropped here.
//!
//! Once shutdown has begun, `persist` fails with `PersistError::Closed`
//! instead of blocking or losing the record silently.

use crate::{PersistError, Record};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Create a queue of the given capacity tied to a shutdown token
pub fn channel(capacity: usize, shutdown: CancellationToken) -> (IngestSender, IngestReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (IngestSender { tx, shutdown }, IngestReceiver { rx })
}

/// Producer handle. Cheap to clone, one per crawler component.
#[derive(Clone)]
pub struct IngestSender {
    tx: mpsc::Sender<Record>,
    shutdown: CancellationToken,
}

impl IngestSender {
    /// Enqueue a record for persistence
    ///
    /// Waits while the queue is full. The eventual commit outcome is never
    /// reported back to the producer.
    ///
    /// # Returns
    /// * `Ok(())` once the record is queued
    /// * `Err(PersistError::Closed)` if shutdown has already begun
    pub async fn persist(&self, record: Record) -> Result<(), PersistError> {
        if self.shutdown.is_cancelled() {
            return Err(PersistError::Closed);
        }
        // The receiver closes its half when draining starts, which also
        // releases producers parked on a full queue.
        self.tx.send(record).await.map_err(|_| PersistError::Closed)
    }

    /// Number of records currently buffered
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.tx.is_closed()
    }
}

/// Consumer half, owned by the persister task
pub struct IngestReceiver {
    rx: mpsc::Receiver<Record>,
}

impl IngestReceiver {
    /// Next record, or `None` once closed and empty
    pub async fn recv(&mut self) -> Option<Record> {
        self.rx.recv().await
    }

    /// Stop accepting new records; buffered ones can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ip_info;
    use std::time::Duration;

    #[tokio::test]
    async fn test_queue_preserves_fifo_order() {
        let (tx, mut rx) = channel(4, CancellationToken::new());

        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            tx.persist(ip_info(ip)).await.unwrap();
        }
        assert_eq!(tx.len(), 3);

        for expected in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            match rx.recv().await {
                Some(Record::IpInfo(info)) => assert_eq!(info.ip, expected),
                other => panic!("Expected ip info, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let (tx, mut rx) = channel(1, CancellationToken::new());
        tx.persist(ip_info("10.0.0.1")).await.unwrap();

        // second send parks until the consumer makes room
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.persist(ip_info("10.0.0.2"))).await;
        assert!(blocked.is_err());

        assert!(rx.recv().await.is_some());
        tx.persist(ip_info("10.0.0.3")).await.unwrap();
    }

    #[tokio::test]
    async fn test_persist_after_shutdown_is_rejected() {
        let shutdown = CancellationToken::new();
        let (tx, _rx) = channel(4, shutdown.clone());

        shutdown.cancel();

        assert!(matches!(tx.persist(ip_info("10.0.0.1")).await, Err(PersistError::Closed)));
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_closing_receiver_releases_parked_producers() {
        let (tx, mut rx) = channel(1, CancellationToken::new());
        tx.persist(ip_info("10.0.0.1")).await.unwrap();

        let producer = {
            let tx = tx.clone();
            tokio::spawn(async move { tx.persist(ip_info("10.0.0.2")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        rx.close();

        assert!(matches!(producer.await.unwrap(), Err(PersistError::Closed)));
        // the buffered record is still delivered
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
