use super::errors::ConfigError;
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// Enable flags and parameters for every transform stage.
///
/// Held behind an `Arc` and replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformsConfig {
    pub normalize: NormalizeConfig,
    pub filtering: FilteringConfig,
    pub reducer: ReducerConfig,
    pub geoip: GeoIpConfig,
    pub user_privacy: UserPrivacyConfig,
    pub latency: LatencyConfig,
    pub suspicious: SuspiciousConfig,
    pub extract: ExtractConfig,
    pub machine_learning: MachineLearningConfig,
    pub atags: ATagsConfig,
}

impl TransformsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filtering.enable {
            self.filtering.validate()?;
        }
        if self.suspicious.enable {
            for pattern in &self.suspicious.whitelist_domains {
                validate_pattern(pattern)?;
            }
        }
        if self.reducer.enable && self.reducer.watch_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "Reducer watch interval cannot be 0".to_string(),
            ));
        }
        if self.latency.enable {
            if self.latency.queries_timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "Latency queries timeout cannot be 0".to_string(),
                ));
            }
            if self.latency.max_pending_queries == 0 {
                return Err(ConfigError::Validation(
                    "Latency max pending queries cannot be 0".to_string(),
                ));
            }
        }
        if self.user_privacy.enable {
            if self.user_privacy.anonymize_v4_bits > 32 {
                return Err(ConfigError::Validation(format!(
                    "IPv4 anonymization prefix /{} is out of range",
                    self.user_privacy.anonymize_v4_bits
                )));
            }
            if self.user_privacy.anonymize_v6_bits > 128 {
                return Err(ConfigError::Validation(format!(
                    "IPv6 anonymization prefix /{} is out of range",
                    self.user_privacy.anonymize_v6_bits
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub enable: bool,
    pub qname_lowercase: bool,
    pub add_tld: bool,
    pub add_tld_plus_one: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilteringConfig {
    pub enable: bool,
    pub log_queries: bool,
    pub log_replies: bool,
    pub drop_rcodes: Vec<String>,
    pub drop_fqdns: Vec<String>,
    pub drop_domain_regexes: Vec<String>,
    pub keep_fqdns: Vec<String>,
    pub keep_domain_regexes: Vec<String>,
    pub drop_query_ips: Vec<String>,
    pub keep_query_ips: Vec<String>,
    pub drop_malformed: bool,
    /// Keep one message out of N; 0 or 1 disables sampling.
    pub downsample: u32,
}

impl FilteringConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for cidr in self.drop_query_ips.iter().chain(&self.keep_query_ips) {
            cidr.parse::<ipnetwork::IpNetwork>().map_err(|e| {
                ConfigError::Validation(format!("Invalid query IP rule {}: {}", cidr, e))
            })?;
        }
        for pattern in self
            .drop_domain_regexes
            .iter()
            .chain(&self.keep_domain_regexes)
        {
            if pattern.is_empty() {
                return Err(ConfigError::Validation(
                    "Domain pattern cannot be empty".to_string(),
                ));
            }
            validate_pattern(pattern)?;
        }
        Ok(())
    }
}

fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!("Invalid domain pattern {}: {}", pattern, e))
    })
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            enable: false,
            log_queries: true,
            log_replies: true,
            drop_rcodes: vec![],
            drop_fqdns: vec![],
            drop_domain_regexes: vec![],
            keep_fqdns: vec![],
            keep_domain_regexes: vec![],
            drop_query_ips: vec![],
            keep_query_ips: vec![],
            drop_malformed: false,
            downsample: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReducerConfig {
    pub enable: bool,
    pub watch_interval_secs: u64,
    pub qname_plus_one: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            enable: false,
            watch_interval_secs: 5,
            qname_plus_one: false,
        }
    }
}

/// Database locations are opaque here; the GeoIP provider interprets them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoIpConfig {
    pub enable: bool,
    pub mmdb_country_file: Option<String>,
    pub mmdb_city_file: Option<String>,
    pub mmdb_asn_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UserPrivacyConfig {
    pub enable: bool,
    pub anonymize_ip: bool,
    pub anonymize_v4_bits: u8,
    pub anonymize_v6_bits: u8,
    pub minimize_qname: bool,
    pub hash_ip: bool,
    pub hash_algo: HashAlgo,
}

impl Default for UserPrivacyConfig {
    fn default() -> Self {
        Self {
            enable: false,
            anonymize_ip: false,
            anonymize_v4_bits: 16,
            anonymize_v6_bits: 64,
            minimize_qname: false,
            hash_ip: false,
            hash_algo: HashAlgo::Sha1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub enable: bool,
    pub measure_latency: bool,
    pub unanswered_queries: bool,
    pub queries_timeout_secs: u64,
    pub max_pending_queries: usize,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enable: false,
            measure_latency: false,
            unanswered_queries: false,
            queries_timeout_secs: 2,
            max_pending_queries: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SuspiciousConfig {
    pub enable: bool,
    pub threshold_qname_len: usize,
    pub threshold_packet_len: usize,
    pub threshold_slow: f64,
    pub threshold_max_labels: usize,
    pub common_qtypes: Vec<String>,
    pub unallowed_chars: Vec<String>,
    pub whitelist_domains: Vec<String>,
}

impl Default for SuspiciousConfig {
    fn default() -> Self {
        Self {
            enable: false,
            threshold_qname_len: 100,
            threshold_packet_len: 1000,
            threshold_slow: 1.0,
            threshold_max_labels: 10,
            common_qtypes: ["A", "AAAA", "TXT", "CNAME", "PTR", "NAPTR", "DNSKEY", "SRV", "SOA", "NS", "MX", "DS", "HTTPS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            unallowed_chars: ["\"", "==", "/", ":"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            whitelist_domains: vec![r"\.ip6\.arpa$".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub enable: bool,
    pub add_payload: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MachineLearningConfig {
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ATagsConfig {
    pub enable: bool,
    pub tags: Vec<String>,
}
