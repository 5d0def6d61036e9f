#![allow(dead_code)]

use bytes::Bytes;
use ferrous_collector_domain::{Envelope, Operation, SocketFamily, SocketProtocol};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

pub fn dns_payload(qname: &str, id: u16, reply: bool) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(&format!("{qname}.")).unwrap());
    query.set_query_type(RecordType::A);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    if reply {
        buf[2] |= 0x80;
    }
    buf
}

pub struct FrameBuilder {
    envelope: Envelope,
}

impl FrameBuilder {
    pub fn client_query(qname: &str, id: u16) -> Self {
        let mut builder = Self::new(Operation::ClientQuery);
        builder.envelope.query_payload = Bytes::from(dns_payload(qname, id, false));
        builder
    }

    pub fn client_reply(qname: &str, id: u16) -> Self {
        let mut builder = Self::new(Operation::ClientResponse);
        builder.envelope.response_payload = Bytes::from(dns_payload(qname, id, true));
        builder
    }

    fn new(operation: Operation) -> Self {
        Self {
            envelope: Envelope {
                identity: "ns1".to_string(),
                version: "bind 9.18".to_string(),
                operation,
                socket_family: SocketFamily::Inet,
                socket_protocol: SocketProtocol::Udp,
                query_address: Some("192.168.1.100".parse().unwrap()),
                query_port: 53000,
                response_address: Some("192.168.1.1".parse().unwrap()),
                response_port: 53,
                query_time_sec: 1_700_000_000,
                response_time_sec: 1_700_000_000,
                ..Default::default()
            },
        }
    }

    /// Capture time of whichever payload the operation carries.
    pub fn at(mut self, sec: u64, nsec: u32) -> Self {
        self.envelope.query_time_sec = sec;
        self.envelope.query_time_nsec = nsec;
        self.envelope.response_time_sec = sec;
        self.envelope.response_time_nsec = nsec;
        self
    }

    pub fn raw_payload(mut self, payload: &'static [u8]) -> Self {
        let payload = Bytes::from_static(payload);
        if self.envelope.operation.direction().is_reply() {
            self.envelope.response_payload = payload;
        } else {
            self.envelope.query_payload = payload;
        }
        self
    }

    pub fn build(self) -> Bytes {
        Bytes::from(serde_json::to_vec(&self.envelope).unwrap())
    }
}
