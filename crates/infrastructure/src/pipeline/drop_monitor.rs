use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

/// Used when a zero report interval is supplied.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Pending drop count per consumer name.
#[derive(Debug, Default)]
pub struct DropLedger {
    counts: FxHashMap<Arc<str>, u64>,
}

impl DropLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: Arc<str>) {
        *self.counts.entry(name).or_insert(0) += 1;
    }

    pub fn pending(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Takes every nonzero counter, sorted by name, and resets them.
    pub fn drain_nonzero(&mut self) -> Vec<(Arc<str>, u64)> {
        let mut drained: Vec<_> = self
            .counts
            .drain()
            .filter(|(_, count)| *count > 0)
            .collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        drained
    }
}

/// Stop/ack pair for a running [`DropMonitor`].
#[derive(Debug, Clone)]
pub struct DropMonitorHandle {
    stop: CancellationToken,
    stopped: CancellationToken,
}

impl DropMonitorHandle {
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    pub async fn await_stopped(&self) {
        self.stopped.cancelled().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }
}

/// Single owner of the [`DropLedger`]. Drop events arrive over a channel and
/// one warning per nonzero consumer is logged on every tick.
pub struct DropMonitor {
    interval: Duration,
    events: mpsc::UnboundedReceiver<Arc<str>>,
    ledger: DropLedger,
    stop: CancellationToken,
    stopped: CancellationToken,
}

impl DropMonitor {
    /// A zero `interval` falls back to [`DEFAULT_REPORT_INTERVAL`].
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedSender<Arc<str>>) {
        let interval = if interval.is_zero() {
            warn!(
                default_secs = DEFAULT_REPORT_INTERVAL.as_secs(),
                "Drop report interval is zero, using default"
            );
            DEFAULT_REPORT_INTERVAL
        } else {
            interval
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = Self {
            interval,
            events: rx,
            ledger: DropLedger::new(),
            stop: CancellationToken::new(),
            stopped: CancellationToken::new(),
        };
        (monitor, tx)
    }

    pub fn handle(&self) -> DropMonitorHandle {
        DropMonitorHandle {
            stop: self.stop.clone(),
            stopped: self.stopped.clone(),
        }
    }

    /// Spawns the monitor inside the caller's span. The join handle lets the
    /// owner notice a task that ended without acknowledging the stop.
    pub fn spawn(self) -> (DropMonitorHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run().in_current_span());
        (handle, task)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run(mut self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                event = self.events.recv(), if events_open => match event {
                    Some(name) => self.ledger.record(name),
                    None => events_open = false,
                },
                _ = ticker.tick() => self.report(),
            }
        }

        self.events.close();
        while let Ok(name) = self.events.try_recv() {
            self.ledger.record(name);
        }
        self.report();

        debug!("Drop monitor stopped");
        self.stopped.cancel();
    }

    fn report(&mut self) {
        for (name, count) in self.ledger.drain_nonzero() {
            warn!(consumer = %name, dropped = count, "{}: {} dropped", name, count);
        }
    }
}
