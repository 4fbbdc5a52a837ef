//! PostgreSQL Store Module
//!
//! `PgStore` owns an `sqlx` connection pool. A batch runs inside a single
//! `sqlx::Transaction`: the whole group of operations is submitted first and
//! then executed one statement at a time as the executor pulls results.

use super::{Store, StoreTransaction};
use crate::{
    StoreError,
    config::DatabaseConfig,
    mapper::{Param, Statement, WriteOperation},
};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{Postgres, Transaction};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Table definitions, created in order when schema initialization is requested
const SCHEMA: &[(&str, &str)] = &[
    (
        "peer_info",
        "CREATE TABLE IF NOT EXISTS peer_info (
            id SERIAL,
            peer_id TEXT PRIMARY KEY,
            ip TEXT,
            tcp_port BIGINT,
            multiaddrs TEXT[],
            last_seen TIMESTAMPTZ,
            user_agent TEXT,
            client_name TEXT,
            client_version TEXT,
            protocol_version TEXT,
            protocols TEXT[],
            pubkey TEXT,
            latency DOUBLE PRECISION,
            metadata_requested BOOLEAN DEFAULT FALSE,
            metadata_succeed BOOLEAN DEFAULT FALSE,
            attempted BOOLEAN DEFAULT FALSE,
            succeed BOOLEAN DEFAULT FALSE,
            attempts BIGINT DEFAULT 0,
            last_error TEXT,
            last_conn_attempt TIMESTAMPTZ,
            deprecated BOOLEAN DEFAULT FALSE,
            last_activity TIMESTAMPTZ
        )",
    ),
    (
        "conn_events",
        "CREATE TABLE IF NOT EXISTS conn_events (
            id SERIAL PRIMARY KEY,
            peer_id TEXT NOT NULL,
            direction TEXT NOT NULL,
            conn_time TIMESTAMPTZ NOT NULL,
            disconn_time TIMESTAMPTZ NOT NULL
        )",
    ),
    (
        "ips",
        "CREATE TABLE IF NOT EXISTS ips (
            id SERIAL,
            ip TEXT PRIMARY KEY,
            expiration_time TIMESTAMPTZ NOT NULL,
            continent TEXT,
            continent_code TEXT,
            country TEXT,
            country_code TEXT,
            region TEXT,
            region_name TEXT,
            city TEXT,
            zip TEXT,
            lat DOUBLE PRECISION,
            lon DOUBLE PRECISION,
            isp TEXT,
            org TEXT,
            asn TEXT,
            as_name TEXT,
            mobile BOOLEAN,
            proxy BOOLEAN,
            hosting BOOLEAN
        )",
    ),
    (
        "eth_nodes",
        "CREATE TABLE IF NOT EXISTS eth_nodes (
            id SERIAL,
            node_id TEXT PRIMARY KEY,
            peer_id TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL,
            seq BIGINT,
            ip TEXT,
            tcp BIGINT,
            udp BIGINT,
            pubkey TEXT,
            fork_digest TEXT,
            next_fork_version TEXT,
            attnets TEXT,
            attnets_number BIGINT
        )",
    ),
    (
        "eth_status",
        "CREATE TABLE IF NOT EXISTS eth_status (
            id SERIAL,
            peer_id TEXT PRIMARY KEY,
            timestamp TIMESTAMPTZ NOT NULL,
            fork_digest TEXT,
            finalized_root TEXT,
            finalized_epoch BIGINT,
            head_root TEXT,
            head_slot BIGINT
        )",
    ),
    (
        "eth_metadata",
        "CREATE TABLE IF NOT EXISTS eth_metadata (
            id SERIAL,
            peer_id TEXT PRIMARY KEY,
            timestamp TIMESTAMPTZ NOT NULL,
            seq_number BIGINT,
            attnets TEXT,
            syncnets TEXT
        )",
    ),
];

/// SQL text for a statement. Parameter order matches the mapper.
fn statement_sql(statement: Statement) -> &'static str {
    match statement {
        Statement::UpsertHostInfo => {
            "INSERT INTO peer_info (peer_id, ip, tcp_port, multiaddrs, last_seen)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (peer_id) DO UPDATE SET
                ip = excluded.ip,
                tcp_port = excluded.tcp_port,
                multiaddrs = excluded.multiaddrs,
                last_seen = excluded.last_seen"
        }
        Statement::UpsertPeerInfo => {
            "INSERT INTO peer_info (peer_id, user_agent, client_name, client_version,
                protocol_version, protocols, pubkey, latency, metadata_requested, metadata_succeed)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (peer_id) DO UPDATE SET
                user_agent = excluded.user_agent,
                client_name = excluded.client_name,
                client_version = excluded.client_version,
                protocol_version = excluded.protocol_version,
                protocols = excluded.protocols,
                pubkey = excluded.pubkey,
                latency = excluded.latency,
                metadata_requested = peer_info.metadata_requested OR excluded.metadata_requested,
                metadata_succeed = peer_info.metadata_succeed OR excluded.metadata_succeed"
        }
        Statement::UpdateConnAttempt => {
            "UPDATE peer_info SET
                attempted = TRUE,
                attempts = attempts + 1,
                last_conn_attempt = $2,
                succeed = succeed OR $3,
                last_error = $4,
                deprecated = $5
             WHERE peer_id = $1"
        }
        Statement::InsertConnEvent => {
            "INSERT INTO conn_events (peer_id, direction, conn_time, disconn_time)
             VALUES ($1, $2, $3, $4)"
        }
        Statement::UpdateLastActivity => {
            "UPDATE peer_info SET last_activity = $2 WHERE peer_id = $1"
        }
        Statement::UpsertIpInfo => {
            "INSERT INTO ips (ip, expiration_time, continent, continent_code, country,
                country_code, region, region_name, city, zip, lat, lon, isp, org, asn,
                as_name, mobile, proxy, hosting)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
             ON CONFLICT (ip) DO UPDATE SET
                expiration_time = excluded.expiration_time,
                continent = excluded.continent,
                continent_code = excluded.continent_code,
                country = excluded.country,
                country_code = excluded.country_code,
                region = excluded.region,
                region_name = excluded.region_name,
                city = excluded.city,
                zip = excluded.zip,
                lat = excluded.lat,
                lon = excluded.lon,
                isp = excluded.isp,
                org = excluded.org,
                asn = excluded.asn,
                as_name = excluded.as_name,
                mobile = excluded.mobile,
                proxy = excluded.proxy,
                hosting = excluded.hosting"
        }
        Statement::UpsertEthStatus => {
            "INSERT INTO eth_status (peer_id, timestamp, fork_digest, finalized_root,
                finalized_epoch, head_root, head_slot)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (peer_id) DO UPDATE SET
                timestamp = excluded.timestamp,
                fork_digest = excluded.fork_digest,
                finalized_root = excluded.finalized_root,
                finalized_epoch = excluded.finalized_epoch,
                head_root = excluded.head_root,
                head_slot = excluded.head_slot"
        }
        Statement::UpsertEthMetadata => {
            "INSERT INTO eth_metadata (peer_id, timestamp, seq_number, attnets, syncnets)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (peer_id) DO UPDATE SET
                timestamp = excluded.timestamp,
                seq_number = excluded.seq_number,
                attnets = excluded.attnets,
                syncnets = excluded.syncnets"
        }
        Statement::UpsertEnrNode => {
            "INSERT INTO eth_nodes (node_id, peer_id, timestamp, seq, ip, tcp, udp, pubkey,
                fork_digest, next_fork_version, attnets, attnets_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (node_id) DO UPDATE SET
                peer_id = excluded.peer_id,
                timestamp = excluded.timestamp,
                seq = excluded.seq,
                ip = excluded.ip,
                tcp = excluded.tcp,
                udp = excluded.udp,
                pubkey = excluded.pubkey,
                fork_digest = excluded.fork_digest,
                next_fork_version = excluded.next_fork_version,
                attnets = excluded.attnets,
                attnets_number = excluded.attnets_number"
        }
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: Param,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        Param::Bool(value) => query.bind(value),
        Param::Int(value) => query.bind(value),
        Param::Float(value) => query.bind(value),
        Param::Text(value) => query.bind(value),
        Param::TextArray(value) => query.bind(value),
        Param::Timestamp(value) => query.bind(value),
    }
}

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the connection pool
    ///
    /// # Arguments
    /// * `config` - Database settings (endpoint and pool size)
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        debug!("successful connection to DB");
        Ok(Self { pool })
    }
}

impl Store for PgStore {
    type Transaction = PgBatchTransaction;

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for (table, ddl) in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
            info!("table {} initialized", table);
        }
        Ok(())
    }

    async fn begin(&self) -> Result<PgBatchTransaction, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgBatchTransaction {
            tx,
            pending: VecDeque::new(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Grouped execution inside one PostgreSQL transaction
pub struct PgBatchTransaction {
    tx: Transaction<'static, Postgres>,
    pending: VecDeque<WriteOperation>,
}

impl StoreTransaction for PgBatchTransaction {
    fn submit(&mut self, operations: Vec<WriteOperation>) {
        self.pending.extend(operations);
    }

    async fn next_result(&mut self) -> Result<Option<u64>, StoreError> {
        let Some(operation) = self.pending.pop_front() else {
            return Ok(None);
        };

        let statement = operation.statement();
        let mut query = sqlx::query(statement_sql(statement));
        for param in operation.into_params() {
            query = bind_param(query, param);
        }

        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Statement {
                statement: statement.name(),
                reason: e.to_string(),
            })?;
        Ok(Some(result.rows_affected()))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
