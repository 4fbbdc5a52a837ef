//! Record builders shared by the unit tests

use crate::{
    Attribute, AttemptStatus, BeaconMetadataStamped, BeaconStatusStamped, ConnDirection,
    ConnEvent, ConnectionAttempt, EnrNode, HostInfo, IpInfo, PeerInfo, Record,
};
use chrono::{Duration, TimeZone, Utc};

pub fn peer_info(peer_id: &str) -> PeerInfo {
    PeerInfo {
        peer_id: peer_id.to_string(),
        user_agent: "Lighthouse/v4.5.0-441fc16/x86_64-linux".to_string(),
        client_name: "lighthouse".to_string(),
        client_version: "v4.5.0".to_string(),
        protocol_version: "ipfs/0.1.0".to_string(),
        protocols: vec!["/eth2/beacon_chain/req/status/1/ssz_snappy".to_string()],
        pubkey: "08021221".to_string(),
        latency: 0.12,
        metadata_requested: true,
        metadata_succeed: true,
    }
}

pub fn host_info(peer_id: &str) -> HostInfo {
    let mut host = HostInfo::new(peer_id, "10.0.0.1", 9000);
    host.multiaddrs = vec!["/ip4/10.0.0.1/tcp/9000".to_string()];
    host
}

pub fn identified_host(peer_id: &str) -> HostInfo {
    let mut host = host_info(peer_id);
    host.peer_info = Some(peer_info(peer_id));
    host
}

pub fn beacon_status(peer_id: &str) -> Attribute {
    Attribute::BeaconStatus(BeaconStatusStamped {
        peer_id: peer_id.to_string(),
        timestamp: Utc::now(),
        fork_digest: "0xbba4da96".to_string(),
        finalized_root: "0x00".to_string(),
        finalized_epoch: 240_000,
        head_root: "0x01".to_string(),
        head_slot: 7_680_032,
    })
}

pub fn beacon_metadata(peer_id: &str) -> Attribute {
    Attribute::BeaconMetadata(BeaconMetadataStamped {
        peer_id: peer_id.to_string(),
        timestamp: Utc::now(),
        seq_number: 12,
        attnets: "0xffffffffffffffff".to_string(),
        syncnets: "0x0f".to_string(),
    })
}

pub fn enr_node(peer_id: &str) -> Attribute {
    Attribute::EnrNode(EnrNode {
        node_id: format!("node-{peer_id}"),
        peer_id: peer_id.to_string(),
        timestamp: Utc::now(),
        seq: 3,
        ip: "10.0.0.1".to_string(),
        tcp: 9000,
        udp: 9000,
        pubkey: "02aa".to_string(),
        fork_digest: "0xbba4da96".to_string(),
        next_fork_version: "0x03000000".to_string(),
        attnets: "0xff".to_string(),
        attnets_number: 8,
    })
}

pub fn conn_attempt(peer_id: &str, succeeded: bool) -> Record {
    let status = if succeeded {
        AttemptStatus::Succeeded
    } else {
        AttemptStatus::Failed { error: "dial backoff".to_string() }
    };
    Record::ConnectionAttempt(ConnectionAttempt {
        peer_id: peer_id.to_string(),
        timestamp: Utc::now(),
        status,
        deprecated: false,
    })
}

pub fn conn_event(peer_id: &str) -> Record {
    let conn_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Record::ConnEvent(ConnEvent {
        peer_id: peer_id.to_string(),
        direction: ConnDirection::Outbound,
        conn_time,
        disc_time: conn_time + Duration::seconds(42),
    })
}

pub fn ip_info(ip: &str) -> Record {
    Record::IpInfo(IpInfo {
        ip: ip.to_string(),
        expiration_time: Utc::now() + Duration::hours(24),
        country: "Spain".to_string(),
        country_code: "ES".to_string(),
        city: "Barcelona".to_string(),
        ..Default::default()
    })
}

pub fn unrecognized() -> Record {
    Record::Unrecognized {
        kind: "gossip_message".to_string(),
        payload: serde_json::json!({ "topic": "beacon_block" }),
    }
}
