//! Record Mapper Module
//!
//! Expands a crawler record into the ordered list of write operations that
//! persist it. The fan-out depends on the record variant:
//!
//! | Record | Operations |
//! |---|---|
//! | HostInfo | host upsert, peer upsert if identified, one per known attribute |
//! | PeerInfo | peer upsert |
//! | ConnectionAttempt | attempt update |
//! | ConnEvent | event insert + last activity update |
//! | IpInfo | ip upsert |
//! | Unrecognized | nothing |

use super::operation::{Statement, WriteOperation};
use crate::{
    Attribute, BeaconMetadataStamped, BeaconStatusStamped, ConnEvent, ConnectionAttempt, EnrNode,
    HostInfo, IpInfo, PeerInfo, Record,
};
use chrono::{DateTime, Utc};
use tracing::{error, trace, warn};

/// Map a record to its write operations
///
/// Unrecognized records and attributes produce no operation; they are
/// logged and otherwise ignored.
pub fn map_record(record: &Record) -> Vec<WriteOperation> {
    match record {
        Record::HostInfo(host) => map_host_info(host),
        Record::PeerInfo(peer) => {
            trace!("persisting new peer_info {}", peer.peer_id);
            vec![upsert_peer_info(peer)]
        }
        Record::ConnectionAttempt(attempt) => {
            trace!("persisting conn_attempt for peer {}", attempt.peer_id);
            vec![update_conn_attempt(attempt)]
        }
        Record::ConnEvent(event) => {
            trace!("persisting conn_event for peer {}", event.peer_id);
            // last activity follows the disconnection time
            vec![
                insert_conn_event(event),
                update_last_activity(&event.peer_id, event.disc_time),
            ]
        }
        Record::IpInfo(ip) => {
            trace!("persisting ip_info {}", ip.ip);
            vec![upsert_ip_info(ip)]
        }
        Record::Unrecognized { kind, payload } => {
            error!(kind = %kind, payload = %payload, "unrecognized type of object received to persist into DB");
            Vec::new()
        }
    }
}

fn map_host_info(host: &HostInfo) -> Vec<WriteOperation> {
    trace!("persisting host_info {}", host.peer_id);

    let mut operations = Vec::with_capacity(2 + host.attributes.len());
    operations.push(upsert_host_info(host));

    if host.is_identified() {
        if let Some(peer) = &host.peer_info {
            operations.push(upsert_peer_info(peer));
        }
    }

    for (name, attribute) in &host.attributes {
        match attribute {
            Attribute::BeaconStatus(status) => operations.push(upsert_eth_status(status)),
            Attribute::BeaconMetadata(metadata) => operations.push(upsert_eth_metadata(metadata)),
            Attribute::EnrNode(node) => operations.push(upsert_enr_node(node)),
            Attribute::Unrecognized { kind } => {
                warn!(peer = %host.peer_id, "not yet recognized type for attr {} - {}", name, kind);
            }
        }
    }

    operations
}

pub fn upsert_host_info(host: &HostInfo) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertHostInfo,
        vec![
            (&host.peer_id).into(),
            (&host.ip).into(),
            host.tcp_port.into(),
            host.multiaddrs.clone().into(),
            host.last_seen.into(),
        ],
    )
}

pub fn upsert_peer_info(peer: &PeerInfo) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertPeerInfo,
        vec![
            (&peer.peer_id).into(),
            (&peer.user_agent).into(),
            (&peer.client_name).into(),
            (&peer.client_version).into(),
            (&peer.protocol_version).into(),
            peer.protocols.clone().into(),
            (&peer.pubkey).into(),
            peer.latency.into(),
            peer.metadata_requested.into(),
            peer.metadata_succeed.into(),
        ],
    )
}

pub fn update_conn_attempt(attempt: &ConnectionAttempt) -> WriteOperation {
    WriteOperation::new(
        Statement::UpdateConnAttempt,
        vec![
            (&attempt.peer_id).into(),
            attempt.timestamp.into(),
            attempt.status.succeeded().into(),
            attempt.status.error().into(),
            attempt.deprecated.into(),
        ],
    )
}

pub fn insert_conn_event(event: &ConnEvent) -> WriteOperation {
    WriteOperation::new(
        Statement::InsertConnEvent,
        vec![
            (&event.peer_id).into(),
            event.direction.as_str().into(),
            event.conn_time.into(),
            event.disc_time.into(),
        ],
    )
}

pub fn update_last_activity(peer_id: &str, timestamp: DateTime<Utc>) -> WriteOperation {
    WriteOperation::new(
        Statement::UpdateLastActivity,
        vec![peer_id.into(), timestamp.into()],
    )
}

pub fn upsert_ip_info(ip: &IpInfo) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertIpInfo,
        vec![
            (&ip.ip).into(),
            ip.expiration_time.into(),
            (&ip.continent).into(),
            (&ip.continent_code).into(),
            (&ip.country).into(),
            (&ip.country_code).into(),
            (&ip.region).into(),
            (&ip.region_name).into(),
            (&ip.city).into(),
            (&ip.zip).into(),
            ip.lat.into(),
            ip.lon.into(),
            (&ip.isp).into(),
            (&ip.org).into(),
            (&ip.asn).into(),
            (&ip.as_name).into(),
            ip.mobile.into(),
            ip.proxy.into(),
            ip.hosting.into(),
        ],
    )
}

pub fn upsert_eth_status(status: &BeaconStatusStamped) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertEthStatus,
        vec![
            (&status.peer_id).into(),
            status.timestamp.into(),
            (&status.fork_digest).into(),
            (&status.finalized_root).into(),
            status.finalized_epoch.into(),
            (&status.head_root).into(),
            status.head_slot.into(),
        ],
    )
}

pub fn upsert_eth_metadata(metadata: &BeaconMetadataStamped) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertEthMetadata,
        vec![
            (&metadata.peer_id).into(),
            metadata.timestamp.into(),
            metadata.seq_number.into(),
            (&metadata.attnets).into(),
            (&metadata.syncnets).into(),
        ],
    )
}

pub fn upsert_enr_node(node: &EnrNode) -> WriteOperation {
    WriteOperation::new(
        Statement::UpsertEnrNode,
        vec![
            (&node.node_id).into(),
            (&node.peer_id).into(),
            node.timestamp.into(),
            node.seq.into(),
            (&node.ip).into(),
            node.tcp.into(),
            node.udp.into(),
            (&node.pubkey).into(),
            (&node.fork_digest).into(),
            (&node.next_fork_version).into(),
            (&node.attnets).into(),
            node.attnets_number.into(),
        ],
    )
}
