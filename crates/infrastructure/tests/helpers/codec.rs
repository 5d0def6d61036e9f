use ferrous_collector_application::ports::EnvelopeCodec;
use ferrous_collector_domain::{DomainError, Envelope};

/// Envelope codec reading frames produced by [`super::FrameBuilder`].
pub struct JsonEnvelopeCodec;

impl EnvelopeCodec for JsonEnvelopeCodec {
    fn unmarshal(&self, frame: &[u8]) -> Result<Envelope, DomainError> {
        serde_json::from_slice(frame).map_err(|e| DomainError::InvalidEnvelope(e.to_string()))
    }
}
