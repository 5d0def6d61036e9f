use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::processor::ProcessorConfig;
use super::transforms::TransformsConfig;

/// Main configuration structure for a collector pipeline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Intake queue and processor loop settings
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Transform chain applied to every ingested message
    #[serde(default)]
    pub transforms: TransformsConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-collector.toml in current directory
    /// 3. /etc/ferrous-collector/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("ferrous-collector.toml").exists() {
            Self::from_file("ferrous-collector.toml")?
        } else if std::path::Path::new("/etc/ferrous-collector/config.toml").exists() {
            Self::from_file("/etc/ferrous-collector/config.toml")?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processor.buffer_size == 0 {
            return Err(ConfigError::Validation(
                "Processor buffer size cannot be 0".to_string(),
            ));
        }

        if self.processor.drop_report_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "Drop report interval cannot be 0".to_string(),
            ));
        }

        self.transforms.validate()
    }
}
