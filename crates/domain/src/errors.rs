use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Malformed DNS payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid envelope frame: {0}")]
    InvalidEnvelope(String),

    #[error("Transform {stage} failed: {reason}")]
    StageFailed { stage: &'static str, reason: String },

    #[error("GeoIP database unavailable: {0}")]
    GeoIpUnavailable(String),

    #[error("GeoIP lookup failed for {ip}: {reason}")]
    GeoIpLookup { ip: String, reason: String },

    #[error("Processor already stopped")]
    ProcessorStopped,
}
