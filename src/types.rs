use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Any object the crawler hands to the persistence tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Record {
    HostInfo(HostInfo),
    PeerInfo(PeerInfo),
    ConnectionAttempt(ConnectionAttempt),
    ConnEvent(ConnEvent),
    IpInfo(IpInfo),
    /// Object type this tier does not know how to persist
    Unrecognized {
        kind: String,
        payload: serde_json::Value,
    },
}

impl Record {
    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &str {
        match self {
            Record::HostInfo(_) => "host_info",
            Record::PeerInfo(_) => "peer_info",
            Record::ConnectionAttempt(_) => "conn_attempt",
            Record::ConnEvent(_) => "conn_event",
            Record::IpInfo(_) => "ip_info",
            Record::Unrecognized { kind, .. } => kind,
        }
    }
}

impl From<HostInfo> for Record {
    fn from(info: HostInfo) -> Self {
        Record::HostInfo(info)
    }
}

impl From<PeerInfo> for Record {
    fn from(info: PeerInfo) -> Self {
        Record::PeerInfo(info)
    }
}

impl From<ConnectionAttempt> for Record {
    fn from(attempt: ConnectionAttempt) -> Self {
        Record::ConnectionAttempt(attempt)
    }
}

impl From<ConnEvent> for Record {
    fn from(event: ConnEvent) -> Self {
        Record::ConnEvent(event)
    }
}

impl From<IpInfo> for Record {
    fn from(info: IpInfo) -> Self {
        Record::IpInfo(info)
    }
}

/// Network-level view of a discovered host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub peer_id: String,
    pub ip: String,
    pub tcp_port: u16,
    pub multiaddrs: Vec<String>,
    pub last_seen: DateTime<Utc>,
    /// Result of the identify exchange, if it happened
    pub peer_info: Option<PeerInfo>,
    /// Protocol metadata gathered from the host, keyed by attribute name
    pub attributes: BTreeMap<String, Attribute>,
}

impl HostInfo {
    pub fn new(peer_id: impl Into<String>, ip: impl Into<String>, tcp_port: u16) -> Self {
        Self {
            peer_id: peer_id.into(),
            ip: ip.into(),
            tcp_port,
            multiaddrs: Vec::new(),
            last_seen: Utc::now(),
            peer_info: None,
            attributes: BTreeMap::new(),
        }
    }

    /// The host counts as identified once the identify exchange resolved
    /// the same peer with a user agent and a protocol version.
    pub fn is_identified(&self) -> bool {
        match &self.peer_info {
            Some(info) => {
                info.peer_id == self.peer_id
                    && !info.user_agent.is_empty()
                    && !info.protocol_version.is_empty()
            }
            None => false,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }
}

/// Identification data of a libp2p peer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer_id: String,
    pub user_agent: String,
    pub client_name: String,
    pub client_version: String,
    pub protocol_version: String,
    pub protocols: Vec<String>,
    pub pubkey: String,
    /// Round trip time in seconds
    pub latency: f64,
    pub metadata_requested: bool,
    pub metadata_succeed: bool,
}

impl PeerInfo {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            ..Default::default()
        }
    }
}

/// Outcome of a dial attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionAttempt {
    pub peer_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: AttemptStatus,
    /// Peer is no longer worth dialing
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Succeeded,
    Failed { error: String },
}

impl AttemptStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, AttemptStatus::Succeeded)
    }

    /// Error label stored with the attempt ("none" on success)
    pub fn error(&self) -> &str {
        match self {
            AttemptStatus::Succeeded => "none",
            AttemptStatus::Failed { error } => error,
        }
    }
}

/// One connection lifetime with a peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnEvent {
    pub peer_id: String,
    pub direction: ConnDirection,
    pub conn_time: DateTime<Utc>,
    pub disc_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnDirection {
    Inbound,
    Outbound,
    Unknown,
}

impl ConnDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnDirection::Inbound => "inbound",
            ConnDirection::Outbound => "outbound",
            ConnDirection::Unknown => "unknown",
        }
    }
}

/// Geolocation data for an IP address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpInfo {
    pub ip: String,
    pub expiration_time: DateTime<Utc>,
    pub continent: String,
    pub continent_code: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub region_name: String,
    pub city: String,
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub isp: String,
    pub org: String,
    pub asn: String,
    pub as_name: String,
    pub mobile: bool,
    pub proxy: bool,
    pub hosting: bool,
}

/// Protocol metadata attached to a [`HostInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Attribute {
    BeaconStatus(BeaconStatusStamped),
    BeaconMetadata(BeaconMetadataStamped),
    EnrNode(EnrNode),
    Unrecognized { kind: String },
}

/// Beacon chain status handshake, with the time it was received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconStatusStamped {
    pub peer_id: String,
    pub timestamp: DateTime<Utc>,
    pub fork_digest: String,
    pub finalized_root: String,
    pub finalized_epoch: u64,
    pub head_root: String,
    pub head_slot: u64,
}

/// Beacon chain metadata response, with the time it was received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconMetadataStamped {
    pub peer_id: String,
    pub timestamp: DateTime<Utc>,
    pub seq_number: u64,
    pub attnets: String,
    pub syncnets: String,
}

/// Node record discovered through discv5
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrNode {
    pub node_id: String,
    pub peer_id: String,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub ip: String,
    pub tcp: u16,
    pub udp: u16,
    pub pubkey: String,
    pub fork_digest: String,
    pub next_fork_version: String,
    pub attnets: String,
    pub attnets_number: u32,
}
