mod consumer;
mod dns_decoder;
mod envelope_codec;
mod geoip;

pub use consumer::Consumer;
pub use dns_decoder::DnsDecoder;
pub use envelope_codec::EnvelopeCodec;
pub use geoip::{GeoIpLookup, GeoIpProvider};
