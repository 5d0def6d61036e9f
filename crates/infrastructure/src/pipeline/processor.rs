use arc_swap::ArcSwap;
use bytes::Bytes;
use ferrous_collector_application::ports::{DnsDecoder, EnvelopeCodec, GeoIpProvider};
use ferrous_collector_application::transforms::{StageOutcome, TransformChain};
use ferrous_collector_domain::{Config, DomainError, NormalizedMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::consumer_set::ConsumerSet;
use super::drop_monitor::DropMonitor;
use super::ingest::{self, DecodeOptions};
use super::router::FanoutRouter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Created,
    Running,
    Cleaning,
    Stopped,
}

enum Control {
    Reload(Arc<Config>),
    Stop(oneshot::Sender<()>),
}

/// Control side of a [`Processor`], cheap to clone and usable after the
/// processor has been moved into its task.
#[derive(Clone)]
pub struct ProcessorHandle {
    control: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<ProcessorState>,
    config: Arc<ArcSwap<Config>>,
}

impl ProcessorHandle {
    pub fn state(&self) -> ProcessorState {
        *self.state.borrow()
    }

    /// Configuration the loop is currently applying.
    pub fn current_config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Effective from the next frame the loop picks up.
    pub fn reload_config(&self, config: Arc<Config>) -> Result<(), DomainError> {
        self.control
            .send(Control::Reload(config))
            .map_err(|_| DomainError::ProcessorStopped)
    }

    /// Resolves once the intake is closed, the drop monitor has flushed and
    /// the transform chain is reset. Returns at once if that already happened.
    pub async fn stop(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.control.send(Control::Stop(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }

        let mut state = self.state.clone();
        let _ = state
            .wait_for(|state| *state == ProcessorState::Stopped)
            .await;
    }
}

/// Ingests raw capture frames, runs them through the transform chain and
/// multicasts the result.
pub struct Processor {
    intake_tx: mpsc::Sender<Bytes>,
    core: ProcessorCore,
}

struct ProcessorCore {
    name: Arc<str>,
    conn_id: u32,
    codec: Arc<dyn EnvelopeCodec>,
    decoder: Arc<dyn DnsDecoder>,
    chain: TransformChain,
    options: DecodeOptions,
    config: Arc<ArcSwap<Config>>,
    intake_rx: mpsc::Receiver<Bytes>,
    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    state_tx: watch::Sender<ProcessorState>,
}

impl Processor {
    pub fn new(
        name: impl Into<Arc<str>>,
        conn_id: u32,
        config: Arc<Config>,
        codec: Arc<dyn EnvelopeCodec>,
        decoder: Arc<dyn DnsDecoder>,
    ) -> Self {
        let name = name.into();
        let (intake_tx, intake_rx) = mpsc::channel(config.processor.buffer_size.max(1));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ProcessorState::Created);
        let chain = TransformChain::new(
            Arc::clone(&name),
            conn_id,
            Arc::new(config.transforms.clone()),
        );

        Self {
            intake_tx,
            core: ProcessorCore {
                name,
                conn_id,
                codec,
                decoder,
                chain,
                options: DecodeOptions::from(&config.processor),
                config: Arc::new(ArcSwap::new(config)),
                intake_rx,
                control_tx,
                control_rx,
                state_tx,
            },
        }
    }

    pub fn with_geoip_provider(mut self, provider: Arc<dyn GeoIpProvider>) -> Self {
        self.core.chain.set_geoip_provider(provider);
        self
    }

    /// Producer side of the bounded frame queue. The processor stops on its
    /// own once every clone has been dropped.
    pub fn intake(&self) -> mpsc::Sender<Bytes> {
        self.intake_tx.clone()
    }

    pub fn handle(&self) -> ProcessorHandle {
        ProcessorHandle {
            control: self.core.control_tx.clone(),
            state: self.core.state_tx.subscribe(),
            config: Arc::clone(&self.core.config),
        }
    }

    /// Runs until stopped through a [`ProcessorHandle`] or until the intake
    /// queue is closed by its producers.
    pub async fn run(self, consumers: ConsumerSet) {
        let Processor { intake_tx, core } = self;
        drop(intake_tx);

        let span = info_span!("processor", name = %core.name, conn_id = core.conn_id);
        core.run(consumers).instrument(span).await;
    }
}

impl ProcessorCore {
    async fn run(mut self, consumers: ConsumerSet) {
        let interval = self.config.load().processor.drop_report_interval();
        let (monitor, drop_tx) = DropMonitor::new(interval);
        let (monitor, mut monitor_task) = monitor.spawn();
        let router = FanoutRouter::new(drop_tx);

        self.chain.prepare();
        self.state_tx.send_replace(ProcessorState::Running);
        info!(consumers = consumers.len(), "Processor running");

        let ack = loop {
            tokio::select! {
                biased;
                Some(control) = self.control_rx.recv() => match control {
                    Control::Reload(config) => self.apply_config(config),
                    Control::Stop(ack) => break Some(ack),
                },
                frame = self.intake_rx.recv() => match frame {
                    Some(frame) => self.handle_frame(&frame, &router, &consumers),
                    None => {
                        info!("Intake closed");
                        break None;
                    }
                },
            }
        };

        self.state_tx.send_replace(ProcessorState::Cleaning);
        self.intake_rx.close();
        drop(router);

        monitor.request_stop();
        tokio::select! {
            _ = monitor.await_stopped() => {}
            joined = &mut monitor_task => {
                if let Err(e) = joined {
                    error!(error = %e, "Drop monitor ended abnormally");
                }
            }
        }
        self.chain.reset();

        self.state_tx.send_replace(ProcessorState::Stopped);
        info!("Processor stopped");

        if let Some(ack) = ack {
            let _ = ack.send(());
        }
        self.control_rx.close();
        while let Ok(control) = self.control_rx.try_recv() {
            if let Control::Stop(ack) = control {
                let _ = ack.send(());
            }
        }
    }

    fn apply_config(&mut self, config: Arc<Config>) {
        self.options = DecodeOptions::from(&config.processor);
        self.chain.reload_config(Arc::new(config.transforms.clone()));
        self.config.store(config);
        info!("Configuration reloaded");
    }

    fn handle_frame(&mut self, frame: &[u8], router: &FanoutRouter, consumers: &ConsumerSet) {
        let envelope = match self.codec.unmarshal(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, length = frame.len(), "Discarding undecodable frame");
                return;
            }
        };

        let mut msg = ingest::normalize(envelope, self.decoder.as_ref(), self.options);
        self.chain.init_message_format(&mut msg);
        let outcome = self.chain.process_message(&mut msg);
        let emitted = self.chain.take_emitted();

        if outcome == StageOutcome::Continue {
            self.deliver(msg, router, consumers);
        }
        for timeout in emitted {
            self.deliver(timeout, router, consumers);
        }
    }

    fn deliver(&self, mut msg: NormalizedMessage, router: &FanoutRouter, consumers: &ConsumerSet) {
        msg.timing.latency_sec = format!("{:.6}", msg.timing.latency);
        let routed = router.route(msg, consumers);
        debug!(
            delivered = routed.delivered,
            dropped = routed.dropped,
            "Message routed"
        );
    }
}
