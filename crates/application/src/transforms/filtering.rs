use fancy_regex::Regex;
use ferrous_collector_domain::{FilteringConfig, FilteringInfo, NormalizedMessage};
use ipnetwork::IpNetwork;
use rustc_hash::FxHashSet;
use std::net::IpAddr;
use tracing::warn;

use super::stage::{StageOutcome, TransformStage};

/// Authoritative keep/drop rules. Any match of a drop rule, or a miss against
/// a non-empty keep list, drops the message.
pub(crate) struct FilteringStage {
    log_queries: bool,
    log_replies: bool,
    drop_malformed: bool,
    drop_rcodes: FxHashSet<String>,
    drop_fqdns: FxHashSet<String>,
    drop_regexes: Vec<Regex>,
    keep_fqdns: FxHashSet<String>,
    keep_regexes: Vec<Regex>,
    drop_ips: Vec<IpNetwork>,
    keep_ips: Vec<IpNetwork>,
    downsample: u32,
    seen: u64,
}

impl FilteringStage {
    pub(crate) fn new(config: &FilteringConfig) -> Self {
        Self {
            log_queries: config.log_queries,
            log_replies: config.log_replies,
            drop_malformed: config.drop_malformed,
            drop_rcodes: config
                .drop_rcodes
                .iter()
                .map(|rcode| rcode.to_ascii_uppercase())
                .collect(),
            drop_fqdns: fqdn_set(&config.drop_fqdns),
            drop_regexes: compile_patterns(&config.drop_domain_regexes),
            keep_fqdns: fqdn_set(&config.keep_fqdns),
            keep_regexes: compile_patterns(&config.keep_domain_regexes),
            drop_ips: parse_networks(&config.drop_query_ips),
            keep_ips: parse_networks(&config.keep_query_ips),
            downsample: config.downsample,
            seen: 0,
        }
    }

    fn rejects_domain(&self, qname: &str) -> bool {
        let qname = qname.trim_end_matches('.').to_ascii_lowercase();

        if self.drop_fqdns.contains(&qname) || matches_any(&self.drop_regexes, &qname) {
            return true;
        }

        let has_keep_rules = !self.keep_fqdns.is_empty() || !self.keep_regexes.is_empty();
        has_keep_rules
            && !self.keep_fqdns.contains(&qname)
            && !matches_any(&self.keep_regexes, &qname)
    }

    fn rejects_ip(&self, query_ip: &str) -> bool {
        if self.drop_ips.is_empty() && self.keep_ips.is_empty() {
            return false;
        }

        let Ok(ip) = query_ip.parse::<IpAddr>() else {
            return !self.keep_ips.is_empty();
        };

        if self.drop_ips.iter().any(|net| net.contains(ip)) {
            return true;
        }
        !self.keep_ips.is_empty() && !self.keep_ips.iter().any(|net| net.contains(ip))
    }
}

impl TransformStage for FilteringStage {
    fn name(&self) -> &'static str {
        "filtering"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        if self.downsample > 1 {
            msg.filtering = Some(FilteringInfo::default());
        }
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        if msg.is_query() && !self.log_queries {
            return StageOutcome::Drop;
        }
        if !msg.is_query() && !self.log_replies {
            return StageOutcome::Drop;
        }
        if self.drop_malformed && msg.dns.malformed {
            return StageOutcome::Drop;
        }
        if self.drop_rcodes.contains(&msg.dns.rcode) {
            return StageOutcome::Drop;
        }
        if self.rejects_ip(&msg.network.query_ip) {
            return StageOutcome::Drop;
        }
        if self.rejects_domain(&msg.dns.qname) {
            return StageOutcome::Drop;
        }

        if self.downsample > 1 {
            let keep = self.seen % u64::from(self.downsample) == 0;
            self.seen += 1;
            if !keep {
                return StageOutcome::Drop;
            }
            msg.filtering = Some(FilteringInfo {
                sample_rate: self.downsample,
            });
        }

        StageOutcome::Continue
    }
}

fn fqdn_set(names: &[String]) -> FxHashSet<String> {
    names
        .iter()
        .map(|name| name.trim_end_matches('.').to_ascii_lowercase())
        .collect()
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid domain pattern skipped");
                None
            }
        })
        .collect()
}

fn parse_networks(rules: &[String]) -> Vec<IpNetwork> {
    rules
        .iter()
        .filter_map(|rule| match rule.parse::<IpNetwork>() {
            Ok(net) => Some(net),
            Err(e) => {
                warn!(rule = %rule, error = %e, "Invalid query IP rule skipped");
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Regex], qname: &str) -> bool {
    patterns.iter().any(|re| re.is_match(qname).unwrap_or(false))
}
