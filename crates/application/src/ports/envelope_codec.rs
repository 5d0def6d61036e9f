use ferrous_collector_domain::{DomainError, Envelope};

/// Unwraps one capture frame into envelope metadata and embedded payloads.
pub trait EnvelopeCodec: Send + Sync {
    fn unmarshal(&self, frame: &[u8]) -> Result<Envelope, DomainError>;
}
