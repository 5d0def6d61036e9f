use ferrous_collector_application::ports::DnsDecoder;
use ferrous_collector_domain::{DnsFlags, DnsHeader, DomainError, SectionCounts, UNKNOWN_FIELD};
use hickory_proto::op::Message;

const HEADER_LEN: usize = 12;

/// Decodes DNS payloads with `hickory-proto`.
///
/// The fixed header is read straight from the buffer; the question and the
/// EDNS-extended response code come from the full hickory parse, which also
/// decides whether the payload counts as malformed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HickoryDnsDecoder;

impl HickoryDnsDecoder {
    pub fn new() -> Self {
        Self
    }
}

struct RawHeader {
    id: u16,
    opcode: u8,
    flags: DnsFlags,
    counts: SectionCounts,
}

fn parse_header(buf: &[u8]) -> Result<RawHeader, DomainError> {
    if buf.len() < HEADER_LEN {
        return Err(DomainError::MalformedPayload(format!(
            "payload too short for a DNS header: {} bytes",
            buf.len()
        )));
    }

    let id = u16::from_be_bytes([buf[0], buf[1]]);
    let bits = u16::from_be_bytes([buf[2], buf[3]]);

    Ok(RawHeader {
        id,
        opcode: ((bits >> 11) & 0x0F) as u8,
        flags: DnsFlags {
            qr: bits & 0x8000 != 0,
            aa: bits & 0x0400 != 0,
            tc: bits & 0x0200 != 0,
            rd: bits & 0x0100 != 0,
            ra: bits & 0x0080 != 0,
            ad: bits & 0x0020 != 0,
            cd: bits & 0x0010 != 0,
        },
        counts: SectionCounts {
            qdcount: u16::from_be_bytes([buf[4], buf[5]]),
            ancount: u16::from_be_bytes([buf[6], buf[7]]),
            nscount: u16::from_be_bytes([buf[8], buf[9]]),
            arcount: u16::from_be_bytes([buf[10], buf[11]]),
        },
    })
}

impl DnsDecoder for HickoryDnsDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DnsHeader, DomainError> {
        let raw = parse_header(payload)?;
        let message = Message::from_vec(payload)
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;

        let (qname, qtype) = match message.queries().first() {
            Some(query) => {
                let name = query.name().to_utf8();
                (
                    name.trim_end_matches('.').to_string(),
                    query.query_type().to_string(),
                )
            }
            None => (UNKNOWN_FIELD.to_string(), UNKNOWN_FIELD.to_string()),
        };

        Ok(DnsHeader {
            id: raw.id,
            opcode: raw.opcode,
            rcode: u16::from(message.response_code()),
            flags: raw.flags,
            counts: raw.counts,
            qname,
            qtype,
        })
    }
}
