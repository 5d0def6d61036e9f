use base64::{engine::general_purpose::STANDARD, Engine};
use ferrous_collector_domain::{ExtractConfig, ExtractedPayload, NormalizedMessage};

use super::stage::{StageOutcome, TransformStage};

pub(crate) struct ExtractStage {
    add_payload: bool,
}

impl ExtractStage {
    pub(crate) fn new(config: &ExtractConfig) -> Self {
        Self {
            add_payload: config.add_payload,
        }
    }
}

impl TransformStage for ExtractStage {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        if self.add_payload {
            msg.extracted = Some(ExtractedPayload::default());
        }
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        if self.add_payload {
            msg.extracted = Some(ExtractedPayload {
                base64_payload: STANDARD.encode(&msg.dns.payload),
            });
        }
        StageOutcome::Continue
    }
}
