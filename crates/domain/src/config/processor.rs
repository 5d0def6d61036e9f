use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcessorConfig {
    /// Capacity of the raw frame intake queue.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Seconds between two drop reports.
    #[serde(default = "default_drop_report_interval_secs")]
    pub drop_report_interval_secs: u64,

    #[serde(default)]
    pub disable_dns_parser: bool,

    /// Dump the payload of packets the decoder rejects.
    #[serde(default)]
    pub log_malformed: bool,
}

impl ProcessorConfig {
    pub fn drop_report_interval(&self) -> Duration {
        Duration::from_secs(self.drop_report_interval_secs)
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            drop_report_interval_secs: default_drop_report_interval_secs(),
            disable_dns_parser: false,
            log_malformed: false,
        }
    }
}

fn default_buffer_size() -> usize {
    4096
}

fn default_drop_report_interval_secs() -> u64 {
    10
}
