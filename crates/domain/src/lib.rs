//! Ferrous Collector Domain Layer
pub mod config;
pub mod dns_header;
pub mod dns_message;
pub mod envelope;
pub mod errors;

pub use config::{
    ATagsConfig, Config, ConfigError, ExtractConfig, FilteringConfig, GeoIpConfig, HashAlgo,
    LatencyConfig, LoggingConfig, MachineLearningConfig, NormalizeConfig, ProcessorConfig,
    ReducerConfig, SuspiciousConfig, TransformsConfig, UserPrivacyConfig,
};
pub use dns_header::{opcode_name, rcode_name, DnsFlags, DnsHeader, SectionCounts};
pub use dns_message::{
    DnsFields, EnvelopeInfo, ExtractedPayload, FeatureVector, FilteringInfo, GeoInfo,
    NetworkInfo, NormalizedMessage, PublicSuffixInfo, ReducerInfo, SuspiciousInfo, Timing,
    UNKNOWN_FIELD,
};
pub use envelope::{
    Direction, EndpointOrientation, Envelope, Operation, SocketFamily, SocketProtocol,
};
pub use errors::DomainError;
