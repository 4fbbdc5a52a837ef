//! Write Operation Module
//!
//! A write operation is a statement identifier plus its ordered positional
//! parameters. The statement text itself belongs to the store backend; this
//! module only names the statement, its kind and the logical table it hits.

use chrono::{DateTime, Utc};

/// How a statement affects its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    /// Insert-or-update keyed by the row's natural identity
    Upsert,
}

/// Every statement the persister can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    UpsertHostInfo,
    UpsertPeerInfo,
    UpdateConnAttempt,
    InsertConnEvent,
    UpdateLastActivity,
    UpsertIpInfo,
    UpsertEthStatus,
    UpsertEthMetadata,
    UpsertEnrNode,
}

impl Statement {
    pub fn name(&self) -> &'static str {
        match self {
            Statement::UpsertHostInfo => "upsert_host_info",
            Statement::UpsertPeerInfo => "upsert_peer_info",
            Statement::UpdateConnAttempt => "update_conn_attempt",
            Statement::InsertConnEvent => "insert_conn_event",
            Statement::UpdateLastActivity => "update_last_activity",
            Statement::UpsertIpInfo => "upsert_ip_info",
            Statement::UpsertEthStatus => "upsert_eth_status",
            Statement::UpsertEthMetadata => "upsert_eth_metadata",
            Statement::UpsertEnrNode => "upsert_enr_node",
        }
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::InsertConnEvent => StatementKind::Insert,
            Statement::UpdateConnAttempt | Statement::UpdateLastActivity => StatementKind::Update,
            _ => StatementKind::Upsert,
        }
    }

    /// Logical table the statement writes to
    pub fn table(&self) -> &'static str {
        match self {
            Statement::UpsertHostInfo
            | Statement::UpsertPeerInfo
            | Statement::UpdateConnAttempt
            | Statement::UpdateLastActivity => "peer_info",
            Statement::InsertConnEvent => "conn_events",
            Statement::UpsertIpInfo => "ips",
            Statement::UpsertEthStatus => "eth_status",
            Statement::UpsertEthMetadata => "eth_metadata",
            Statement::UpsertEnrNode => "eth_nodes",
        }
    }
}

/// Positional statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextArray(Vec<String>),
    Timestamp(DateTime<Utc>),
}

impl Param {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Param::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<u64> for Param {
    // BIGINT columns are signed; values past i64::MAX saturate
    fn from(value: u64) -> Self {
        Param::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(i64::from(value))
    }
}

impl From<u16> for Param {
    fn from(value: u16) -> Self {
        Param::Int(i64::from(value))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Text(value.clone())
    }
}

impl From<Vec<String>> for Param {
    fn from(value: Vec<String>) -> Self {
        Param::TextArray(value)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(value: DateTime<Utc>) -> Self {
        Param::Timestamp(value)
    }
}

/// A parameterized write, immutable once built.
///
/// The first parameter is always the natural identity of the row
/// (peer id, node id or IP address).
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOperation {
    statement: Statement,
    params: Vec<Param>,
}

impl WriteOperation {
    pub fn new(statement: Statement, params: Vec<Param>) -> Self {
        Self { statement, params }
    }

    pub fn statement(&self) -> Statement {
        self.statement
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Param> {
        self.params
    }

    /// Natural identity of the affected row
    pub fn identity(&self) -> Option<&str> {
        self.params.first().and_then(Param::as_text)
    }
}
