pub mod errors;
pub mod logging;
pub mod processor;
pub mod root;
pub mod transforms;

pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use processor::ProcessorConfig;
pub use root::Config;
pub use transforms::{
    ATagsConfig, ExtractConfig, FilteringConfig, GeoIpConfig, HashAlgo, LatencyConfig,
    MachineLearningConfig, NormalizeConfig, ReducerConfig, SuspiciousConfig, TransformsConfig,
    UserPrivacyConfig,
};
