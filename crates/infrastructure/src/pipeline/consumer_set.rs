use ferrous_collector_application::ports::Consumer;
use ferrous_collector_domain::NormalizedMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ConsumerEntry {
    pub name: Arc<str>,
    pub sender: mpsc::Sender<NormalizedMessage>,
}

/// Ordered (queue, name) pairs, assembled once per pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ConsumerSet {
    entries: Vec<ConsumerEntry>,
}

impl ConsumerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_consumers(consumers: &[Arc<dyn Consumer>]) -> Self {
        let mut set = Self::new();
        for consumer in consumers {
            set.push(consumer.name(), consumer.input());
        }
        set
    }

    pub fn push(&mut self, name: impl Into<Arc<str>>, sender: mpsc::Sender<NormalizedMessage>) {
        self.entries.push(ConsumerEntry {
            name: name.into(),
            sender,
        });
    }

    pub fn entries(&self) -> &[ConsumerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
