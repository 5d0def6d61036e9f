use ferrous_collector_domain::{ATagsConfig, NormalizedMessage};

use super::stage::{StageOutcome, TransformStage};

pub(crate) struct ATagsStage {
    tags: Vec<String>,
}

impl ATagsStage {
    pub(crate) fn new(config: &ATagsConfig) -> Self {
        Self {
            tags: config.tags.clone(),
        }
    }
}

impl TransformStage for ATagsStage {
    fn name(&self) -> &'static str {
        "atags"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        msg.tags = Some(Vec::new());
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        msg.tags
            .get_or_insert_with(Vec::new)
            .extend(self.tags.iter().cloned());
        StageOutcome::Continue
    }
}
