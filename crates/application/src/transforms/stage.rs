use ferrous_collector_domain::{DomainError, NormalizedMessage};

/// Result of running one stage on one message.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Continue,
    Drop,
    /// Logged by the chain; the message keeps going.
    Error(DomainError),
}

pub trait TransformStage: Send {
    fn name(&self) -> &'static str;

    /// Allocates the extension slot this stage fills, if any.
    fn init_message(&self, _msg: &mut NormalizedMessage) {}

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome;

    /// Synthetic messages produced since the last call.
    fn take_emitted(&mut self) -> Vec<NormalizedMessage> {
        Vec::new()
    }
}
