use ferrous_collector_domain::{DomainError, HashAlgo, NormalizedMessage, UserPrivacyConfig};
use ipnetwork::{Ipv4Network, Ipv6Network};
use sha2::Digest;
use std::net::IpAddr;

use super::labels;
use super::stage::{StageOutcome, TransformStage};

/// Anonymizes or hashes client addresses and trims query names.
pub(crate) struct UserPrivacyStage {
    anonymize_ip: bool,
    v4_bits: u8,
    v6_bits: u8,
    minimize_qname: bool,
    hash_ip: bool,
    hash_algo: HashAlgo,
}

impl UserPrivacyStage {
    pub(crate) fn new(config: &UserPrivacyConfig) -> Self {
        Self {
            anonymize_ip: config.anonymize_ip,
            v4_bits: config.anonymize_v4_bits,
            v6_bits: config.anonymize_v6_bits,
            minimize_qname: config.minimize_qname,
            hash_ip: config.hash_ip,
            hash_algo: config.hash_algo,
        }
    }

    fn anonymize(&self, raw: &str) -> Result<Option<String>, DomainError> {
        let Ok(ip) = raw.parse::<IpAddr>() else {
            return Ok(None);
        };

        let masked = match ip {
            IpAddr::V4(v4) => Ipv4Network::new(v4, self.v4_bits)
                .map(|net| net.network().to_string())
                .map_err(|e| e.to_string()),
            IpAddr::V6(v6) => Ipv6Network::new(v6, self.v6_bits)
                .map(|net| net.network().to_string())
                .map_err(|e| e.to_string()),
        };

        masked.map(Some).map_err(|reason| DomainError::StageFailed {
            stage: "user_privacy",
            reason,
        })
    }

    fn hash(&self, value: &str) -> String {
        match self.hash_algo {
            HashAlgo::Sha1 => format!("{:x}", sha1::Sha1::digest(value.as_bytes())),
            HashAlgo::Sha256 => format!("{:x}", sha2::Sha256::digest(value.as_bytes())),
            HashAlgo::Sha512 => format!("{:x}", sha2::Sha512::digest(value.as_bytes())),
        }
    }
}

impl TransformStage for UserPrivacyStage {
    fn name(&self) -> &'static str {
        "user_privacy"
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        if self.minimize_qname {
            if let Some(minimized) = labels::suffix(&msg.dns.qname, 2) {
                msg.dns.qname = minimized;
            }
        }

        if self.anonymize_ip {
            match self.anonymize(&msg.network.query_ip) {
                Ok(Some(masked)) => msg.network.query_ip = masked,
                Ok(None) => {}
                Err(e) => return StageOutcome::Error(e),
            }
        }

        if self.hash_ip {
            if msg.network.query_ip.parse::<IpAddr>().is_ok() {
                msg.network.query_ip = self.hash(&msg.network.query_ip);
            }
            if msg.network.response_ip.parse::<IpAddr>().is_ok() {
                msg.network.response_ip = self.hash(&msg.network.response_ip);
            }
        }

        StageOutcome::Continue
    }
}
