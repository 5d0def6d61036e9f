use chrono::{DateTime, SecondsFormat};
use ferrous_collector_application::ports::DnsDecoder;
use ferrous_collector_domain::{
    EndpointOrientation, Envelope, NormalizedMessage, ProcessorConfig, UNKNOWN_FIELD,
};
use std::fmt::Write;
use std::net::IpAddr;
use tracing::{debug, info};

/// Decode switches derived from [`ProcessorConfig`] on start and on reload.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DecodeOptions {
    pub disable_dns_parser: bool,
    pub log_malformed: bool,
}

impl From<&ProcessorConfig> for DecodeOptions {
    fn from(cfg: &ProcessorConfig) -> Self {
        Self {
            disable_dns_parser: cfg.disable_dns_parser,
            log_malformed: cfg.log_malformed,
        }
    }
}

fn text_or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN_FIELD.to_string()
    } else {
        value
    }
}

fn address_or_unknown(addr: Option<IpAddr>) -> String {
    addr.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
}

fn hex_dump(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len() * 2);
    for byte in payload {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Builds the normalized message for one envelope.
///
/// Direction comes from the envelope operation only. A decode failure flags
/// the message as malformed and keeps the raw payload.
pub(crate) fn normalize(
    envelope: Envelope,
    decoder: &dyn DnsDecoder,
    options: DecodeOptions,
) -> NormalizedMessage {
    let direction = envelope.direction();
    let mut msg = NormalizedMessage::new(direction, envelope.operation);
    let (payload, time_sec, time_nsec) = {
        let (payload, sec, nsec) = envelope.observed();
        (payload.clone(), sec, nsec)
    };

    msg.envelope.identity = text_or_unknown(envelope.identity);
    msg.envelope.version = text_or_unknown(envelope.version);
    msg.envelope.extra = text_or_unknown(envelope.extra);

    msg.network.family = envelope.socket_family;
    msg.network.protocol = envelope.socket_protocol;
    msg.network.query_ip = address_or_unknown(envelope.query_address);
    msg.network.query_port = envelope.query_port;
    msg.network.response_ip = address_or_unknown(envelope.response_address);
    msg.network.response_port = envelope.response_port;
    if envelope.orientation == EndpointOrientation::Captured && direction.is_reply() {
        msg.network.swap_endpoints();
    }

    msg.set_payload(payload);
    set_timestamps(&mut msg, time_sec, time_nsec);

    if !options.disable_dns_parser {
        match decoder.decode(&msg.dns.payload) {
            Ok(header) => msg.apply_header(&header),
            Err(e) => {
                msg.mark_malformed();
                debug!(error = %e, length = msg.dns.length, "DNS payload not decodable");
                if options.log_malformed {
                    info!(
                        operation = %msg.envelope.operation,
                        payload = %hex_dump(&msg.dns.payload),
                        "Malformed DNS packet"
                    );
                }
            }
        }
    }

    msg
}

fn set_timestamps(msg: &mut NormalizedMessage, time_sec: u64, time_nsec: u32) {
    msg.timing.time_sec = time_sec;
    msg.timing.time_nsec = time_nsec;

    let secs = i64::try_from(time_sec).unwrap_or(i64::MAX);
    msg.timing.timestamp_ns = secs
        .saturating_mul(1_000_000_000)
        .saturating_add(i64::from(time_nsec));

    if let Some(ts) = DateTime::from_timestamp(secs, time_nsec) {
        msg.timing.timestamp_rfc3339 = ts.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    }
}
