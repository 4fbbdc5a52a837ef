//! Ingestion Queue Module
//!
//! Bounded multi-producer/single-consumer queue feeding the persister task.

mod ingest;

pub use ingest::{channel, IngestReceiver, IngestSender};
