use ferrous_collector_domain::NormalizedMessage;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

use super::consumer_set::{ConsumerEntry, ConsumerSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    pub delivered: usize,
    pub dropped: usize,
}

/// Non-blocking multicast to every consumer of a [`ConsumerSet`].
///
/// Never awaits: a full or closed consumer queue costs one drop event for that
/// consumer's name and delivery moves on to the next one.
#[derive(Debug, Clone)]
pub struct FanoutRouter {
    drops: mpsc::UnboundedSender<Arc<str>>,
}

impl FanoutRouter {
    pub fn new(drops: mpsc::UnboundedSender<Arc<str>>) -> Self {
        Self { drops }
    }

    /// Each consumer gets its own copy; the last one receives the original.
    pub fn route(&self, msg: NormalizedMessage, consumers: &ConsumerSet) -> RouteOutcome {
        let mut outcome = RouteOutcome::default();
        let Some((last, rest)) = consumers.entries().split_last() else {
            return outcome;
        };

        for entry in rest {
            self.deliver(entry, msg.clone(), &mut outcome);
        }
        self.deliver(last, msg, &mut outcome);
        outcome
    }

    fn deliver(&self, entry: &ConsumerEntry, msg: NormalizedMessage, outcome: &mut RouteOutcome) {
        match entry.sender.try_send(msg) {
            Ok(()) => outcome.delivered += 1,
            Err(TrySendError::Full(_)) => {
                outcome.dropped += 1;
                self.record_drop(entry);
            }
            Err(TrySendError::Closed(_)) => {
                trace!(consumer = %entry.name, "Consumer queue closed");
                outcome.dropped += 1;
                self.record_drop(entry);
            }
        }
    }

    fn record_drop(&self, entry: &ConsumerEntry) {
        // Monitor already gone during teardown; nothing left to report to.
        let _ = self.drops.send(Arc::clone(&entry.name));
    }
}
