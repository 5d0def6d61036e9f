use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Query,
    Reply,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Query => "QUERY",
            Direction::Reply => "REPLY",
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Direction::Reply)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message type declared by the capture envelope.
///
/// Numeric codes follow the DNSTap `Message.Type` enumeration, so envelope
/// codecs can map the wire value with [`Operation::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    AuthQuery,
    AuthResponse,
    ResolverQuery,
    ResolverResponse,
    #[default]
    ClientQuery,
    ClientResponse,
    ForwarderQuery,
    ForwarderResponse,
    StubQuery,
    StubResponse,
    ToolQuery,
    ToolResponse,
    UpdateQuery,
    UpdateResponse,
}

impl Operation {
    pub fn from_code(code: u32) -> Option<Self> {
        let op = match code {
            1 => Operation::AuthQuery,
            2 => Operation::AuthResponse,
            3 => Operation::ResolverQuery,
            4 => Operation::ResolverResponse,
            5 => Operation::ClientQuery,
            6 => Operation::ClientResponse,
            7 => Operation::ForwarderQuery,
            8 => Operation::ForwarderResponse,
            9 => Operation::StubQuery,
            10 => Operation::StubResponse,
            11 => Operation::ToolQuery,
            12 => Operation::ToolResponse,
            13 => Operation::UpdateQuery,
            14 => Operation::UpdateResponse,
            _ => return None,
        };
        Some(op)
    }

    pub fn code(&self) -> u32 {
        match self {
            Operation::AuthQuery => 1,
            Operation::AuthResponse => 2,
            Operation::ResolverQuery => 3,
            Operation::ResolverResponse => 4,
            Operation::ClientQuery => 5,
            Operation::ClientResponse => 6,
            Operation::ForwarderQuery => 7,
            Operation::ForwarderResponse => 8,
            Operation::StubQuery => 9,
            Operation::StubResponse => 10,
            Operation::ToolQuery => 11,
            Operation::ToolResponse => 12,
            Operation::UpdateQuery => 13,
            Operation::UpdateResponse => 14,
        }
    }

    /// The only discriminator used to tell queries from replies.
    pub fn direction(&self) -> Direction {
        match self {
            Operation::AuthQuery
            | Operation::ResolverQuery
            | Operation::ClientQuery
            | Operation::ForwarderQuery
            | Operation::StubQuery
            | Operation::ToolQuery
            | Operation::UpdateQuery => Direction::Query,
            Operation::AuthResponse
            | Operation::ResolverResponse
            | Operation::ClientResponse
            | Operation::ForwarderResponse
            | Operation::StubResponse
            | Operation::ToolResponse
            | Operation::UpdateResponse => Direction::Reply,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AuthQuery => "AUTH_QUERY",
            Operation::AuthResponse => "AUTH_RESPONSE",
            Operation::ResolverQuery => "RESOLVER_QUERY",
            Operation::ResolverResponse => "RESOLVER_RESPONSE",
            Operation::ClientQuery => "CLIENT_QUERY",
            Operation::ClientResponse => "CLIENT_RESPONSE",
            Operation::ForwarderQuery => "FORWARDER_QUERY",
            Operation::ForwarderResponse => "FORWARDER_RESPONSE",
            Operation::StubQuery => "STUB_QUERY",
            Operation::StubResponse => "STUB_RESPONSE",
            Operation::ToolQuery => "TOOL_QUERY",
            Operation::ToolResponse => "TOOL_RESPONSE",
            Operation::UpdateQuery => "UPDATE_QUERY",
            Operation::UpdateResponse => "UPDATE_RESPONSE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketFamily {
    Inet,
    Inet6,
    #[default]
    Unknown,
}

impl SocketFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketFamily::Inet => "IPv4",
            SocketFamily::Inet6 => "IPv6",
            SocketFamily::Unknown => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketProtocol {
    Udp,
    Tcp,
    Dot,
    Doh,
    Doq,
    DnscryptUdp,
    DnscryptTcp,
    #[default]
    Unknown,
}

impl SocketProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketProtocol::Udp => "UDP",
            SocketProtocol::Tcp => "TCP",
            SocketProtocol::Dot => "DOT",
            SocketProtocol::Doh => "DOH",
            SocketProtocol::Doq => "DOQ",
            SocketProtocol::DnscryptUdp => "DNSCRYPT_UDP",
            SocketProtocol::DnscryptTcp => "DNSCRYPT_TCP",
            SocketProtocol::Unknown => "-",
        }
    }
}

/// How the envelope's query/response endpoints were recorded.
///
/// DNSTap producers always report the client as the query side. Sniffers only
/// know the packet's source and destination, so for a reply the client sits
/// on the "response" side until the processor swaps it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointOrientation {
    #[default]
    ClientOriented,
    Captured,
}

/// One captured transaction as produced by an envelope codec.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub extra: String,
    pub operation: Operation,
    #[serde(default)]
    pub socket_family: SocketFamily,
    #[serde(default)]
    pub socket_protocol: SocketProtocol,
    #[serde(default)]
    pub query_address: Option<IpAddr>,
    #[serde(default)]
    pub query_port: u16,
    #[serde(default)]
    pub response_address: Option<IpAddr>,
    #[serde(default)]
    pub response_port: u16,
    #[serde(default)]
    pub query_payload: Bytes,
    #[serde(default)]
    pub query_time_sec: u64,
    #[serde(default)]
    pub query_time_nsec: u32,
    #[serde(default)]
    pub response_payload: Bytes,
    #[serde(default)]
    pub response_time_sec: u64,
    #[serde(default)]
    pub response_time_nsec: u32,
    #[serde(default)]
    pub orientation: EndpointOrientation,
}

impl Envelope {
    pub fn direction(&self) -> Direction {
        self.operation.direction()
    }

    /// Payload and capture time matching the declared direction.
    pub fn observed(&self) -> (&Bytes, u64, u32) {
        match self.direction() {
            Direction::Query => (
                &self.query_payload,
                self.query_time_sec,
                self.query_time_nsec,
            ),
            Direction::Reply => (
                &self.response_payload,
                self.response_time_sec,
                self.response_time_nsec,
            ),
        }
    }
}
