use ferrous_collector_domain::{LatencyConfig, NormalizedMessage};
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use super::stage::{StageOutcome, TransformStage};

pub(crate) const TIMEOUT_RCODE: &str = "TIMEOUT";

/// Identity of one transaction. Endpoints are already client-oriented, so a
/// query and its reply produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TransactionKey {
    client_ip: String,
    client_port: u16,
    qname: String,
    qtype: String,
    id: u16,
}

impl TransactionKey {
    fn of(msg: &NormalizedMessage) -> Self {
        Self {
            client_ip: msg.network.query_ip.clone(),
            client_port: msg.network.query_port,
            qname: msg.dns.qname.clone(),
            qtype: msg.dns.qtype.clone(),
            id: msg.dns.id,
        }
    }
}

fn capacity(max_pending: usize) -> NonZeroUsize {
    NonZeroUsize::new(max_pending).unwrap_or(NonZeroUsize::MIN)
}

fn timeout_ns(config: &LatencyConfig) -> i64 {
    i64::try_from(config.queries_timeout_secs)
        .unwrap_or(i64::MAX / 1_000_000_000)
        .saturating_mul(1_000_000_000)
}

/// Fills `timing.latency` on replies matched to a pending query.
pub(crate) struct MeasureLatencyStage {
    timeout_ns: i64,
    pending: LruCache<TransactionKey, i64>,
}

impl MeasureLatencyStage {
    pub(crate) fn new(config: &LatencyConfig) -> Self {
        Self {
            timeout_ns: timeout_ns(config),
            pending: LruCache::new(capacity(config.max_pending_queries)),
        }
    }
}

impl TransformStage for MeasureLatencyStage {
    fn name(&self) -> &'static str {
        "latency"
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        let key = TransactionKey::of(msg);
        let now = msg.timing.timestamp_ns;

        if msg.is_query() {
            self.pending.put(key, now);
            return StageOutcome::Continue;
        }

        if let Some(sent_at) = self.pending.pop(&key) {
            let elapsed = now - sent_at;
            if elapsed >= 0 && elapsed <= self.timeout_ns {
                msg.timing.latency = elapsed as f64 / 1_000_000_000.0;
            }
        }
        StageOutcome::Continue
    }
}

/// Tracks queries without a reply and emits a `TIMEOUT` copy of each one
/// still pending after the configured timeout.
pub(crate) struct UnansweredQueryStage {
    timeout_ns: i64,
    pending: LruCache<TransactionKey, NormalizedMessage>,
    emitted: Vec<NormalizedMessage>,
}

impl UnansweredQueryStage {
    pub(crate) fn new(config: &LatencyConfig) -> Self {
        Self {
            timeout_ns: timeout_ns(config),
            pending: LruCache::new(capacity(config.max_pending_queries)),
            emitted: Vec::new(),
        }
    }

    fn evict_expired(&mut self, now: i64) {
        while let Some((_, oldest)) = self.pending.peek_lru() {
            if now - oldest.timing.timestamp_ns < self.timeout_ns {
                break;
            }
            if let Some((_, mut query)) = self.pending.pop_lru() {
                query.dns.rcode = TIMEOUT_RCODE.to_string();
                self.emitted.push(query);
            }
        }
    }
}

impl TransformStage for UnansweredQueryStage {
    fn name(&self) -> &'static str {
        "unanswered_queries"
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        self.evict_expired(msg.timing.timestamp_ns);

        let key = TransactionKey::of(msg);
        if msg.is_query() {
            if let Some((evicted, _)) = self.pending.push(key.clone(), msg.clone()) {
                if evicted != key {
                    debug!(qname = %evicted.qname, "Pending query table full, oldest entry discarded");
                }
            }
        } else {
            self.pending.pop(&key);
        }
        StageOutcome::Continue
    }

    fn take_emitted(&mut self) -> Vec<NormalizedMessage> {
        std::mem::take(&mut self.emitted)
    }
}
