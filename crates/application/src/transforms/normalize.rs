use ferrous_collector_domain::{DomainError, NormalizeConfig, NormalizedMessage, PublicSuffixInfo};

use super::labels;
use super::stage::{StageOutcome, TransformStage};

pub(crate) struct NormalizeStage {
    qname_lowercase: bool,
    add_tld: bool,
    add_tld_plus_one: bool,
}

impl NormalizeStage {
    pub(crate) fn new(config: &NormalizeConfig) -> Self {
        Self {
            qname_lowercase: config.qname_lowercase,
            add_tld: config.add_tld,
            add_tld_plus_one: config.add_tld_plus_one,
        }
    }
}

impl TransformStage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        if self.add_tld || self.add_tld_plus_one {
            msg.public_suffix = Some(PublicSuffixInfo::default());
        }
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        if self.qname_lowercase {
            msg.dns.qname.make_ascii_lowercase();
        }

        if !(self.add_tld || self.add_tld_plus_one) || !labels::is_known(&msg.dns.qname) {
            return StageOutcome::Continue;
        }

        let tld = labels::suffix(&msg.dns.qname, 1);
        let tld_plus_one = labels::suffix(&msg.dns.qname, 2);
        let info = msg.public_suffix.get_or_insert_with(PublicSuffixInfo::default);

        if self.add_tld {
            if let Some(tld) = tld {
                info.tld = tld;
            }
        }
        if self.add_tld_plus_one {
            match tld_plus_one {
                Some(etld) => info.etld_plus_one = etld,
                None => {
                    return StageOutcome::Error(DomainError::StageFailed {
                        stage: "normalize",
                        reason: format!("no TLD+1 in {}", msg.dns.qname),
                    })
                }
            }
        }
        StageOutcome::Continue
    }
}
