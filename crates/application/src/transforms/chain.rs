use ferrous_collector_domain::{NormalizedMessage, TransformsConfig};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::extract::ExtractStage;
use super::features::FeaturesStage;
use super::filtering::FilteringStage;
use super::geoip::GeoIpStage;
use super::latency::{MeasureLatencyStage, UnansweredQueryStage};
use super::normalize::NormalizeStage;
use super::privacy::UserPrivacyStage;
use super::reducer::ReducerStage;
use super::stage::{StageOutcome, TransformStage};
use super::suspicious::SuspiciousStage;
use super::tags::ATagsStage;
use crate::ports::{GeoIpLookup, GeoIpProvider};

/// Ordered list of enabled transform stages for one pipeline.
///
/// Normalize, filtering and reducer always run first, in that order, and are
/// the only stages allowed to drop a message. Everything else runs afterwards
/// in registration order. The stage list is only rebuilt by [`prepare`] and
/// [`reload_config`], never while a message is in flight.
///
/// [`prepare`]: TransformChain::prepare
/// [`reload_config`]: TransformChain::reload_config
pub struct TransformChain {
    name: Arc<str>,
    instance: u32,
    config: Arc<TransformsConfig>,
    geoip_provider: Option<Arc<dyn GeoIpProvider>>,
    geoip: Option<Arc<dyn GeoIpLookup>>,
    stages: Vec<Box<dyn TransformStage>>,
}

impl TransformChain {
    pub fn new(name: impl Into<Arc<str>>, instance: u32, config: Arc<TransformsConfig>) -> Self {
        Self {
            name: name.into(),
            instance,
            config,
            geoip_provider: None,
            geoip: None,
            stages: Vec::new(),
        }
    }

    pub fn with_geoip_provider(mut self, provider: Arc<dyn GeoIpProvider>) -> Self {
        self.set_geoip_provider(provider);
        self
    }

    /// Takes effect on the next [`prepare`](TransformChain::prepare).
    pub fn set_geoip_provider(&mut self, provider: Arc<dyn GeoIpProvider>) {
        self.geoip_provider = Some(provider);
        self.geoip = None;
    }

    pub fn config(&self) -> &Arc<TransformsConfig> {
        &self.config
    }

    /// Names of the active stages in execution order.
    pub fn active_stages(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Rebuilds the stage list from the held configuration.
    pub fn prepare(&mut self) {
        let cfg = Arc::clone(&self.config);
        let mut stages: Vec<Box<dyn TransformStage>> = Vec::new();

        if cfg.normalize.enable {
            stages.push(Box::new(NormalizeStage::new(&cfg.normalize)));
        }
        if cfg.filtering.enable {
            stages.push(Box::new(FilteringStage::new(&cfg.filtering)));
        }
        if cfg.reducer.enable {
            stages.push(Box::new(ReducerStage::new(&cfg.reducer)));
        }

        if cfg.geoip.enable {
            if let Some(lookup) = self.open_geoip() {
                stages.push(Box::new(GeoIpStage::new(lookup)));
            }
        } else {
            self.geoip = None;
        }
        if cfg.user_privacy.enable {
            stages.push(Box::new(UserPrivacyStage::new(&cfg.user_privacy)));
        }
        if cfg.latency.enable && cfg.latency.measure_latency {
            stages.push(Box::new(MeasureLatencyStage::new(&cfg.latency)));
        }
        if cfg.latency.enable && cfg.latency.unanswered_queries {
            stages.push(Box::new(UnansweredQueryStage::new(&cfg.latency)));
        }
        if cfg.suspicious.enable {
            stages.push(Box::new(SuspiciousStage::new(&cfg.suspicious)));
        }
        if cfg.extract.enable {
            stages.push(Box::new(ExtractStage::new(&cfg.extract)));
        }
        if cfg.machine_learning.enable {
            stages.push(Box::new(FeaturesStage::new(&cfg.suspicious.common_qtypes)));
        }
        if cfg.atags.enable {
            stages.push(Box::new(ATagsStage::new(&cfg.atags)));
        }

        for stage in &stages {
            info!(
                processor = %self.name,
                instance = self.instance,
                transform = stage.name(),
                "Transform enabled"
            );
        }
        self.stages = stages;
    }

    fn open_geoip(&mut self) -> Option<Arc<dyn GeoIpLookup>> {
        if let Some(lookup) = &self.geoip {
            return Some(Arc::clone(lookup));
        }

        let Some(provider) = &self.geoip_provider else {
            error!(
                processor = %self.name,
                instance = self.instance,
                "GeoIP enabled but no provider attached, transform skipped"
            );
            return None;
        };

        match provider.open(&self.config.geoip) {
            Ok(lookup) => {
                self.geoip = Some(Arc::clone(&lookup));
                Some(lookup)
            }
            Err(e) => {
                error!(
                    processor = %self.name,
                    instance = self.instance,
                    error = %e,
                    "Failed to open GeoIP database, transform skipped"
                );
                None
            }
        }
    }

    /// Replaces the parameters and rebuilds the stage list.
    pub fn reload_config(&mut self, config: Arc<TransformsConfig>) {
        if self.config.geoip != config.geoip {
            self.geoip = None;
        }
        self.config = config;
        self.prepare();
    }

    /// Allocates extension slots for the enabled stages only.
    pub fn init_message_format(&self, msg: &mut NormalizedMessage) {
        for stage in &self.stages {
            stage.init_message(msg);
        }
    }

    /// Runs every active stage. Only [`StageOutcome::Continue`] or
    /// [`StageOutcome::Drop`] are returned; stage errors are logged here.
    pub fn process_message(&mut self, msg: &mut NormalizedMessage) -> StageOutcome {
        for stage in self.stages.iter_mut() {
            match stage.apply(msg) {
                StageOutcome::Continue => {}
                StageOutcome::Drop => {
                    debug!(
                        processor = %self.name,
                        transform = stage.name(),
                        qname = %msg.dns.qname,
                        "Message dropped"
                    );
                    return StageOutcome::Drop;
                }
                StageOutcome::Error(e) => {
                    error!(
                        processor = %self.name,
                        instance = self.instance,
                        transform = stage.name(),
                        error = %e,
                        "Transform failed"
                    );
                }
            }
        }
        StageOutcome::Continue
    }

    pub fn take_emitted(&mut self) -> Vec<NormalizedMessage> {
        let mut emitted = Vec::new();
        for stage in self.stages.iter_mut() {
            emitted.extend(stage.take_emitted());
        }
        emitted
    }

    /// Releases stage state and the GeoIP handle.
    pub fn reset(&mut self) {
        self.stages.clear();
        self.geoip = None;
        debug!(processor = %self.name, instance = self.instance, "Transform chain reset");
    }
}
