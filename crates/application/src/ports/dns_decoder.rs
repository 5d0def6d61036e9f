use ferrous_collector_domain::{DnsHeader, DomainError};

/// Pure decode of a DNS wire payload into its header and first question.
///
/// Returns [`DomainError::MalformedPayload`] when the payload cannot be read.
pub trait DnsDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DnsHeader, DomainError>;
}
