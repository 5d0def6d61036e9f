use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ferrous_collector_application::ports::Consumer;
use ferrous_collector_domain::{Config, DomainError, NormalizedMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Consumer backed by a plain bounded queue; the receiving half goes to
/// whatever worker drains it.
pub struct QueueConsumer {
    name: Arc<str>,
    sender: mpsc::Sender<NormalizedMessage>,
    running: AtomicBool,
    config: ArcSwapOption<Config>,
}

impl QueueConsumer {
    pub fn new(
        name: impl Into<Arc<str>>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<NormalizedMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let consumer = Self {
            name: name.into(),
            sender,
            running: AtomicBool::new(false),
            config: ArcSwapOption::empty(),
        };
        (consumer, receiver)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn current_config(&self) -> Option<Arc<Config>> {
        self.config.load_full()
    }
}

#[async_trait]
impl Consumer for QueueConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> mpsc::Sender<NormalizedMessage> {
        self.sender.clone()
    }

    async fn start(&self) -> Result<(), DomainError> {
        self.running.store(true, Ordering::Release);
        info!(
            consumer = %self.name,
            capacity = self.sender.max_capacity(),
            "Consumer started"
        );
        Ok(())
    }

    async fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!(consumer = %self.name, "Consumer stopped");
        }
    }

    async fn reload_config(&self, config: Arc<Config>) {
        self.config.store(Some(config));
        info!(consumer = %self.name, "Consumer configuration reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_lifecycle() {
        let (consumer, mut rx) = QueueConsumer::new("archive", 2);
        assert!(!consumer.is_running());
        assert!(consumer.current_config().is_none());

        consumer.start().await.unwrap();
        assert!(consumer.is_running());
        assert!(logs_contain("Consumer started"));

        consumer
            .input()
            .try_send(NormalizedMessage::default())
            .unwrap();
        assert!(rx.recv().await.is_some());

        consumer.reload_config(Arc::new(Config::default())).await;
        assert!(consumer.current_config().is_some());

        consumer.stop().await;
        consumer.stop().await;
        assert!(!consumer.is_running());
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|l| l.contains("Consumer stopped")).count() {
                1 => Ok(()),
                n => Err(format!("expected one stop log, found {n}")),
            }
        });
    }
}
