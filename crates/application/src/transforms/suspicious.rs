use fancy_regex::Regex;
use ferrous_collector_domain::{NormalizedMessage, SuspiciousConfig, SuspiciousInfo};
use rustc_hash::FxHashSet;
use tracing::warn;

use super::labels;
use super::stage::{StageOutcome, TransformStage};

pub(crate) struct SuspiciousStage {
    threshold_qname_len: usize,
    threshold_packet_len: usize,
    threshold_slow: f64,
    threshold_max_labels: usize,
    common_qtypes: FxHashSet<String>,
    unallowed_chars: Vec<String>,
    whitelist: Vec<Regex>,
}

impl SuspiciousStage {
    pub(crate) fn new(config: &SuspiciousConfig) -> Self {
        let whitelist = config
            .whitelist_domains
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Invalid whitelist pattern skipped");
                    None
                }
            })
            .collect();

        Self {
            threshold_qname_len: config.threshold_qname_len,
            threshold_packet_len: config.threshold_packet_len,
            threshold_slow: config.threshold_slow,
            threshold_max_labels: config.threshold_max_labels,
            common_qtypes: config
                .common_qtypes
                .iter()
                .map(|qtype| qtype.to_ascii_uppercase())
                .collect(),
            unallowed_chars: config.unallowed_chars.clone(),
            whitelist,
        }
    }

    fn is_whitelisted(&self, qname: &str) -> bool {
        self.whitelist
            .iter()
            .any(|re| re.is_match(qname).unwrap_or(false))
    }
}

impl TransformStage for SuspiciousStage {
    fn name(&self) -> &'static str {
        "suspicious"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        msg.suspicious = Some(SuspiciousInfo::default());
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        let qname = msg.dns.qname.as_str();
        if self.is_whitelisted(qname) {
            return StageOutcome::Continue;
        }

        let mut info = SuspiciousInfo::default();
        let known = labels::is_known(qname);

        info.malformed_packet = msg.dns.malformed;
        info.large_packet = msg.dns.length > self.threshold_packet_len;
        info.slow_domain = msg.timing.latency > self.threshold_slow;
        if known {
            info.long_domain = qname.len() > self.threshold_qname_len;
            info.unallowed_chars = self
                .unallowed_chars
                .iter()
                .any(|needle| qname.contains(needle.as_str()));
            info.excessive_number_of_labels =
                labels::split(qname).len() > self.threshold_max_labels;
        }
        if !msg.dns.malformed && labels::is_known(&msg.dns.qtype) {
            info.uncommon_qtypes = !self.common_qtypes.contains(&msg.dns.qtype);
        }

        info.score = [
            info.malformed_packet,
            info.large_packet,
            info.long_domain,
            info.slow_domain,
            info.unallowed_chars,
            info.uncommon_qtypes,
            info.excessive_number_of_labels,
        ]
        .iter()
        .filter(|hit| **hit)
        .count() as f64;

        msg.suspicious = Some(info);
        StageOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use ferrous_collector_domain::{Direction, Operation};

    fn message(qname: &str, qtype: &str) -> NormalizedMessage {
        let mut msg = NormalizedMessage::new(Direction::Query, Operation::ClientQuery);
        msg.dns.qname = qname.to_string();
        msg.dns.qtype = qtype.to_string();
        msg.set_payload(Bytes::from_static(&[0u8; 40]));
        msg
    }

    #[test]
    fn test_clean_query_scores_zero() {
        let mut stage = SuspiciousStage::new(&SuspiciousConfig::default());
        let mut msg = message("www.example.com", "A");

        stage.apply(&mut msg);
        let info = msg.suspicious.unwrap();
        assert_eq!(info.score, 0.0);
        assert!(!info.uncommon_qtypes);
    }

    #[test]
    fn test_each_hit_adds_one() {
        let mut stage = SuspiciousStage::new(&SuspiciousConfig {
            threshold_qname_len: 20,
            threshold_max_labels: 3,
            ..Default::default()
        });
        let mut msg = message("a.b.c.d.e.exfil-data.example.com", "NULL");
        msg.timing.latency = 2.5;

        stage.apply(&mut msg);
        let info = msg.suspicious.unwrap();
        assert!(info.long_domain);
        assert!(info.excessive_number_of_labels);
        assert!(info.uncommon_qtypes);
        assert!(info.slow_domain);
        assert!(!info.large_packet);
        assert_eq!(info.score, 4.0);
    }

    #[test]
    fn test_unallowed_chars() {
        let mut stage = SuspiciousStage::new(&SuspiciousConfig::default());
        let mut msg = message("dGVzdA==.example.com", "A");

        stage.apply(&mut msg);
        assert!(msg.suspicious.unwrap().unallowed_chars);
    }

    #[test]
    fn test_whitelisted_names_are_never_flagged() {
        let mut stage = SuspiciousStage::new(&SuspiciousConfig {
            threshold_max_labels: 2,
            ..Default::default()
        });
        let mut msg = message("1.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa", "PTR");
        stage.init_message(&mut msg);

        stage.apply(&mut msg);
        assert_eq!(msg.suspicious.unwrap(), SuspiciousInfo::default());
    }

    #[test]
    fn test_malformed_packet() {
        let mut stage = SuspiciousStage::new(&SuspiciousConfig::default());
        let mut msg = message("-", "-");
        msg.mark_malformed();

        stage.apply(&mut msg);
        let info = msg.suspicious.unwrap();
        assert!(info.malformed_packet);
        assert!(!info.uncommon_qtypes);
        assert_eq!(info.score, 1.0);
    }
}
