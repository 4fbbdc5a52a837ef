//! Write-Operation Mapping Module
//!
//! This module turns crawler records into parameterized write operations:
//! - `operation`: statement identifiers, parameters and the `WriteOperation` type
//! - `mapper`: the per-variant dispatch from `Record` to operations
//!
//! Mapping is pure; the only side effect is logging of unrecognized input.

mod operation;
mod mapper;


pub use operation::{Param, Statement, StatementKind, WriteOperation};
pub use mapper::{
    map_record,
    insert_conn_event,
    update_conn_attempt,
    update_last_activity,
    upsert_enr_node,
    upsert_eth_metadata,
    upsert_eth_status,
    upsert_host_info,
    upsert_ip_info,
    upsert_peer_info,
};
