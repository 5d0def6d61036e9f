use async_trait::async_trait;
use ferrous_collector_domain::{Config, DomainError, NormalizedMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A downstream worker fed by the fan-out router.
///
/// The router only ever calls `try_send` on the sender returned by
/// [`Consumer::input`], so the queue capacity is the consumer's whole
/// tolerance for bursts.
#[async_trait]
pub trait Consumer: Send + Sync {
    fn name(&self) -> &str;
    fn input(&self) -> mpsc::Sender<NormalizedMessage>;
    async fn start(&self) -> Result<(), DomainError>;
    async fn stop(&self);
    async fn reload_config(&self, config: Arc<Config>);
}
