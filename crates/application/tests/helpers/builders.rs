#![allow(dead_code)]

use bytes::Bytes;
use ferrous_collector_domain::{Direction, NormalizedMessage, Operation};

pub struct MessageBuilder {
    msg: NormalizedMessage,
}

impl MessageBuilder {
    pub fn query(qname: &str) -> Self {
        Self::new(Direction::Query, Operation::ClientQuery, qname)
    }

    pub fn reply(qname: &str) -> Self {
        Self::new(Direction::Reply, Operation::ClientResponse, qname)
    }

    fn new(direction: Direction, operation: Operation, qname: &str) -> Self {
        let mut msg = NormalizedMessage::new(direction, operation);
        msg.dns.qname = qname.to_string();
        msg.dns.qtype = "A".to_string();
        msg.dns.rcode = "NOERROR".to_string();
        msg.dns.id = 4242;
        msg.network.query_ip = "192.168.1.100".to_string();
        msg.network.query_port = 53000;
        msg.network.response_ip = "192.168.1.1".to_string();
        msg.network.response_port = 53;
        msg.set_payload(Bytes::from_static(&[0u8; 29]));
        Self { msg }
    }

    pub fn client_ip(mut self, ip: &str) -> Self {
        self.msg.network.query_ip = ip.to_string();
        self
    }

    pub fn qtype(mut self, qtype: &str) -> Self {
        self.msg.dns.qtype = qtype.to_string();
        self
    }

    pub fn id(mut self, id: u16) -> Self {
        self.msg.dns.id = id;
        self
    }

    pub fn at_millis(mut self, ms: i64) -> Self {
        self.msg.timing.timestamp_ns = ms * 1_000_000;
        self
    }

    pub fn malformed(mut self) -> Self {
        self.msg.mark_malformed();
        self
    }

    pub fn build(self) -> NormalizedMessage {
        self.msg
    }
}
