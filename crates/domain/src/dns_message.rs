use crate::dns_header::{rcode_name, DnsFlags, DnsHeader, SectionCounts};
use crate::envelope::{Direction, Operation, SocketFamily, SocketProtocol};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Placeholder for text fields that were never populated.
pub const UNKNOWN_FIELD: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeInfo {
    pub identity: String,
    pub version: String,
    pub extra: String,
    pub operation: Operation,
}

impl Default for EnvelopeInfo {
    fn default() -> Self {
        Self {
            identity: UNKNOWN_FIELD.to_string(),
            version: UNKNOWN_FIELD.to_string(),
            extra: UNKNOWN_FIELD.to_string(),
            operation: Operation::default(),
        }
    }
}

/// Endpoints always seen from the client: `query_*` is the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub family: SocketFamily,
    pub protocol: SocketProtocol,
    pub query_ip: String,
    pub query_port: u16,
    pub response_ip: String,
    pub response_port: u16,
}

impl NetworkInfo {
    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.query_ip, &mut self.response_ip);
        std::mem::swap(&mut self.query_port, &mut self.response_port);
    }
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self {
            family: SocketFamily::Unknown,
            protocol: SocketProtocol::Unknown,
            query_ip: UNKNOWN_FIELD.to_string(),
            query_port: 0,
            response_ip: UNKNOWN_FIELD.to_string(),
            response_port: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsFields {
    pub id: u16,
    pub opcode: u8,
    pub rcode: String,
    pub flags: DnsFlags,
    pub counts: SectionCounts,
    pub qname: String,
    pub qtype: String,
    pub payload: Bytes,
    pub length: usize,
    pub malformed: bool,
}

impl Default for DnsFields {
    fn default() -> Self {
        Self {
            id: 0,
            opcode: 0,
            rcode: UNKNOWN_FIELD.to_string(),
            flags: DnsFlags::default(),
            counts: SectionCounts::default(),
            qname: UNKNOWN_FIELD.to_string(),
            qtype: UNKNOWN_FIELD.to_string(),
            payload: Bytes::new(),
            length: 0,
            malformed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub time_sec: u64,
    pub time_nsec: u32,
    pub timestamp_ns: i64,
    pub timestamp_rfc3339: String,
    /// Seconds between the matching query and this reply, 0 when unknown.
    pub latency: f64,
    pub latency_sec: String,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            time_sec: 0,
            time_nsec: 0,
            timestamp_ns: 0,
            timestamp_rfc3339: UNKNOWN_FIELD.to_string(),
            latency: 0.0,
            latency_sec: UNKNOWN_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSuffixInfo {
    pub tld: String,
    pub etld_plus_one: String,
}

impl Default for PublicSuffixInfo {
    fn default() -> Self {
        Self {
            tld: UNKNOWN_FIELD.to_string(),
            etld_plus_one: UNKNOWN_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilteringInfo {
    pub sample_rate: u32,
}

/// Summary of the previous reducer window for this message's key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReducerInfo {
    pub occurrences: u64,
    pub cumulative_length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub continent: String,
    pub country_iso_code: String,
    pub city: String,
    pub autonomous_system_number: String,
    pub autonomous_system_org: String,
}

impl Default for GeoInfo {
    fn default() -> Self {
        Self {
            continent: UNKNOWN_FIELD.to_string(),
            country_iso_code: UNKNOWN_FIELD.to_string(),
            city: UNKNOWN_FIELD.to_string(),
            autonomous_system_number: UNKNOWN_FIELD.to_string(),
            autonomous_system_org: UNKNOWN_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedPayload {
    pub base64_payload: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuspiciousInfo {
    pub score: f64,
    pub malformed_packet: bool,
    pub large_packet: bool,
    pub long_domain: bool,
    pub slow_domain: bool,
    pub unallowed_chars: bool,
    pub uncommon_qtypes: bool,
    pub excessive_number_of_labels: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub size: usize,
    pub length: usize,
    pub labels: usize,
    pub digits: usize,
    pub lowers: usize,
    pub uppers: usize,
    pub specials: usize,
    pub others: usize,
    pub ratio_digits: f64,
    pub ratio_letters: f64,
    pub ratio_specials: f64,
    pub ratio_others: f64,
    pub entropy: f64,
    pub consecutive_chars: usize,
    pub consecutive_vowels: usize,
    pub consecutive_digits: usize,
    pub consecutive_consonants: usize,
    pub uncommon_qtypes: bool,
}

/// Canonical record of one captured DNS transaction.
///
/// Extension slots (`public_suffix` .. `tags`) stay `None` unless the
/// matching transform is enabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub direction: Direction,
    pub envelope: EnvelopeInfo,
    pub network: NetworkInfo,
    pub dns: DnsFields,
    pub timing: Timing,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_suffix: Option<PublicSuffixInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtering: Option<FilteringInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reducer: Option<ReducerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<ExtractedPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious: Option<SuspiciousInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NormalizedMessage {
    pub fn new(direction: Direction, operation: Operation) -> Self {
        let mut msg = Self {
            direction,
            ..Default::default()
        };
        msg.envelope.operation = operation;
        msg
    }

    pub fn set_payload(&mut self, payload: Bytes) {
        self.dns.length = payload.len();
        self.dns.payload = payload;
    }

    pub fn apply_header(&mut self, header: &DnsHeader) {
        self.dns.id = header.id;
        self.dns.opcode = header.opcode;
        self.dns.rcode = rcode_name(header.rcode).to_string();
        self.dns.flags = header.flags;
        self.dns.counts = header.counts;
        self.dns.qname = header.qname.clone();
        self.dns.qtype = header.qtype.clone();
    }

    /// Flags the payload as undecodable; the payload itself is kept.
    pub fn mark_malformed(&mut self) {
        self.dns.malformed = true;
    }

    pub fn is_query(&self) -> bool {
        self.direction == Direction::Query
    }
}
