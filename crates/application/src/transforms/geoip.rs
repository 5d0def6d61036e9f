use ferrous_collector_domain::{DomainError, GeoInfo, NormalizedMessage};
use std::net::IpAddr;
use std::sync::Arc;

use super::stage::{StageOutcome, TransformStage};
use crate::ports::GeoIpLookup;

pub(crate) struct GeoIpStage {
    lookup: Arc<dyn GeoIpLookup>,
}

impl GeoIpStage {
    pub(crate) fn new(lookup: Arc<dyn GeoIpLookup>) -> Self {
        Self { lookup }
    }
}

impl TransformStage for GeoIpStage {
    fn name(&self) -> &'static str {
        "geoip"
    }

    fn init_message(&self, msg: &mut NormalizedMessage) {
        msg.geo = Some(GeoInfo::default());
    }

    fn apply(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        let ip = match msg.network.query_ip.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                return StageOutcome::Error(DomainError::GeoIpLookup {
                    ip: msg.network.query_ip.clone(),
                    reason: "not an IP address".to_string(),
                })
            }
        };

        match self.lookup.lookup(ip) {
            Ok(info) => {
                msg.geo = Some(info);
                StageOutcome::Continue
            }
            Err(e) => StageOutcome::Error(e),
        }
    }
}
