use ferrous_collector_domain::{NormalizedMessage, ReducerConfig, ReducerInfo};
use rustc_hash::FxHashMap;

use super::labels;
use super::stage::{StageOutcome, TransformStage};

#[derive(Debug, Clone, Copy, Default)]
struct WindowCount {
    occurrences: u64,
    cumulative_length: u64,
}

/// Collapses repeats of the same transaction inside a watch window.
///
/// The first occurrence of a key in a window passes through and carries the
/// totals accumulated for that key during the previous window.
pub(crate) struct ReducerStage {
    watch_interval_ns: i64,
    qname_plus_one: bool,
    window_start: Option<i64>,
    current: FxHashMap<String, WindowCount>,
    previous: FxHashMap<String, WindowCount>,
}

impl ReducerStage {
    pub(crate) fn new(config: &ReducerConfig) -> Self {
        let watch_interval_ns = i64::try_from(config.watch_interval_secs)
            .unwrap_or(i64::MAX / 1_000_000_000)
            .saturating_mul(1_000_000_000);
        Self {
            watch_interval_ns,
            qname_plus_one: config.qname_plus_one,
            window_start: None,
            current: FxHashMap::default(),
            previous: FxHashMap::default(),
        }
    }

    fn key(&self, msg: &NormalizedMessage) -> String {
        let qname = if self.qname_plus_one {
            labels::suffix(&msg.dns.qname, 2).unwrap_or_else(|| msg.dns.qname.clone())
        } else {
            msg.dns.qname.clone()
        };
        format!(
            "{}|{}|{}|{}|{}",
            msg.envelope.identity,
            msg.envelope.operation,
            msg.network.query_ip,
            qname,
            msg.dns.qtype
        )
    }

    fn roll_window(&mut self, now_ns: i64) {
        match self.window_start {
            None => self.window_start = Some(now_ns),
            Some(start) if now_ns.saturating_sub(start) >= self.watch_interval_ns => {
                self.previous = std::mem::take(&mut self.current);
                self.window_start = Some(now_ns);
            }
            Some(_) => {}
        }
    }
}

impl TransformStage for ReducerStage {
    fn name(&self) -> &'static str {
        "reducer"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        msg.reducer = Some(ReducerInfo::default());
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        self.roll_window(msg.timing.timestamp_ns);

        let key = self.key(msg);
        let length = msg.dns.length as u64;

        if let Some(count) = self.current.get_mut(&key) {
            count.occurrences += 1;
            count.cumulative_length += length;
            return StageOutcome::Drop;
        }

        let summary = self.previous.remove(&key).unwrap_or(WindowCount {
            occurrences: 1,
            cumulative_length: length,
        });
        msg.reducer = Some(ReducerInfo {
            occurrences: summary.occurrences,
            cumulative_length: summary.cumulative_length,
        });

        self.current.insert(
            key,
            WindowCount {
                occurrences: 1,
                cumulative_length: length,
            },
        );
        StageOutcome::Continue
    }
}
