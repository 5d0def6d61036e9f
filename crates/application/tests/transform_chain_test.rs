mod helpers;

use ferrous_collector_application::transforms::{StageOutcome, TransformChain};
use ferrous_collector_domain::TransformsConfig;
use helpers::{FailingGeoIpProvider, MessageBuilder, MockGeoIpProvider};
use std::sync::Arc;
use tracing_test::traced_test;

fn chain(config: TransformsConfig) -> TransformChain {
    let mut chain = TransformChain::new("test", 0, Arc::new(config));
    chain.prepare();
    chain
}

fn drop_fqdn(fqdn: &str) -> TransformsConfig {
    let mut config = TransformsConfig::default();
    config.filtering.enable = true;
    config.filtering.drop_fqdns = vec![fqdn.to_string()];
    config
}

#[test]
fn test_empty_chain_forwards_untouched() {
    let mut chain = chain(TransformsConfig::default());
    let mut msg = MessageBuilder::query("example.com").build();
    let before = msg.clone();

    chain.init_message_format(&mut msg);
    assert_eq!(chain.process_message(&mut msg), StageOutcome::Continue);
    assert_eq!(msg, before);
    assert!(chain.active_stages().is_empty());
}

#[test]
fn test_authoritative_stages_run_first() {
    let mut config = TransformsConfig::default();
    config.atags.enable = true;
    config.suspicious.enable = true;
    config.reducer.enable = true;
    config.normalize.enable = true;
    config.filtering.enable = true;
    config.extract.enable = true;
    config.machine_learning.enable = true;
    config.user_privacy.enable = true;
    config.latency.enable = true;
    config.latency.measure_latency = true;
    config.latency.unanswered_queries = true;

    let chain = chain(config);

    assert_eq!(
        chain.active_stages(),
        vec![
            "normalize",
            "filtering",
            "reducer",
            "user_privacy",
            "latency",
            "unanswered_queries",
            "suspicious",
            "extract",
            "machine_learning",
            "atags",
        ]
    );
}

#[test]
#[traced_test]
fn test_prepare_logs_one_line_per_enabled_stage() {
    let mut config = TransformsConfig::default();
    config.normalize.enable = true;
    config.atags.enable = true;

    let _chain = chain(config);

    logs_assert(|lines: &[&str]| {
        let enabled = lines
            .iter()
            .filter(|line| line.contains("Transform enabled"))
            .count();
        if enabled == 2 {
            Ok(())
        } else {
            Err(format!("expected 2 enabled transforms, got {}", enabled))
        }
    });
}

#[test]
fn test_drop_rule_short_circuits_later_stages() {
    let mut config = drop_fqdn("ads.example.com");
    config.atags.enable = true;
    config.atags.tags = vec!["seen".to_string()];
    let mut chain = chain(config);

    let mut dropped = MessageBuilder::query("ads.example.com").build();
    chain.init_message_format(&mut dropped);
    assert_eq!(chain.process_message(&mut dropped), StageOutcome::Drop);
    assert_eq!(dropped.tags, Some(vec![]));

    let mut kept = MessageBuilder::query("www.example.com").build();
    chain.init_message_format(&mut kept);
    assert_eq!(chain.process_message(&mut kept), StageOutcome::Continue);
    assert_eq!(kept.tags, Some(vec!["seen".to_string()]));
}

#[test]
fn test_init_message_format_allocates_only_enabled_slots() {
    let mut config = TransformsConfig::default();
    config.suspicious.enable = true;
    config.atags.enable = true;
    let chain = chain(config);

    let mut msg = MessageBuilder::query("example.com").build();
    chain.init_message_format(&mut msg);

    assert!(msg.suspicious.is_some());
    assert!(msg.tags.is_some());
    assert!(msg.geo.is_none());
    assert!(msg.features.is_none());
    assert!(msg.reducer.is_none());
    assert!(msg.public_suffix.is_none());
}

#[test]
fn test_reload_applies_from_next_message() {
    let mut chain = chain(TransformsConfig::default());

    let mut before = MessageBuilder::query("ads.example.com").build();
    assert_eq!(chain.process_message(&mut before), StageOutcome::Continue);

    chain.reload_config(Arc::new(drop_fqdn("ads.example.com")));
    assert_eq!(chain.active_stages(), vec!["filtering"]);

    let mut after = MessageBuilder::query("ads.example.com").build();
    assert_eq!(chain.process_message(&mut after), StageOutcome::Drop);

    chain.reload_config(Arc::new(TransformsConfig::default()));
    let mut restored = MessageBuilder::query("ads.example.com").build();
    assert_eq!(chain.process_message(&mut restored), StageOutcome::Continue);
}

#[test]
fn test_prepare_is_idempotent() {
    let mut chain = chain(drop_fqdn("ads.example.com"));
    chain.prepare();
    chain.prepare();

    assert_eq!(chain.active_stages(), vec!["filtering"]);
}

#[test]
fn test_geoip_enrichment() {
    let provider = Arc::new(MockGeoIpProvider::new().with_country("8.8.8.8", "US"));
    let mut config = TransformsConfig::default();
    config.geoip.enable = true;
    let mut chain = TransformChain::new("test", 0, Arc::new(config)).with_geoip_provider(provider);
    chain.prepare();

    let mut msg = MessageBuilder::query("example.com").client_ip("8.8.8.8").build();
    chain.init_message_format(&mut msg);
    chain.process_message(&mut msg);

    assert_eq!(msg.geo.unwrap().country_iso_code, "US");
}

#[test]
#[traced_test]
fn test_stage_error_is_logged_and_message_continues() {
    let provider = Arc::new(MockGeoIpProvider::new());
    let mut config = TransformsConfig::default();
    config.geoip.enable = true;
    config.atags.enable = true;
    config.atags.tags = vec!["after-geoip".to_string()];
    let mut chain = TransformChain::new("test", 0, Arc::new(config)).with_geoip_provider(provider);
    chain.prepare();

    let mut msg = MessageBuilder::query("example.com").client_ip("10.9.9.9").build();
    chain.init_message_format(&mut msg);

    assert_eq!(chain.process_message(&mut msg), StageOutcome::Continue);
    assert_eq!(msg.geo.unwrap().country_iso_code, "-");
    assert_eq!(msg.tags, Some(vec!["after-geoip".to_string()]));
    assert!(logs_contain("Transform failed"));
    assert!(logs_contain("10.9.9.9"));
}

#[test]
#[traced_test]
fn test_unavailable_geoip_database_skips_stage() {
    let mut config = TransformsConfig::default();
    config.geoip.enable = true;
    config.geoip.mmdb_country_file = Some("/missing/country.mmdb".to_string());
    let mut chain = TransformChain::new("test", 0, Arc::new(config))
        .with_geoip_provider(Arc::new(FailingGeoIpProvider));
    chain.prepare();

    assert!(chain.active_stages().is_empty());
    assert!(logs_contain("Failed to open GeoIP database"));
}

#[test]
fn test_geoip_handle_reused_across_reloads_and_released_on_reset() {
    let provider = Arc::new(MockGeoIpProvider::new());
    let mut config = TransformsConfig::default();
    config.geoip.enable = true;
    let config = Arc::new(config);
    let mut chain =
        TransformChain::new("test", 0, Arc::clone(&config)).with_geoip_provider(provider.clone());
    chain.prepare();

    let mut tagged = (*config).clone();
    tagged.atags.enable = true;
    chain.reload_config(Arc::new(tagged));
    assert_eq!(provider.open_count(), 1);

    chain.reset();
    assert!(chain.active_stages().is_empty());
    chain.prepare();
    assert_eq!(provider.open_count(), 2);
}

#[test]
fn test_unanswered_queries_are_emitted_as_timeouts() {
    let mut config = TransformsConfig::default();
    config.latency.enable = true;
    config.latency.unanswered_queries = true;
    config.latency.queries_timeout_secs = 1;
    let mut chain = chain(config);

    let mut lost = MessageBuilder::query("lost.example.com").id(1).at_millis(0).build();
    chain.process_message(&mut lost);
    assert!(chain.take_emitted().is_empty());

    let mut later = MessageBuilder::query("next.example.com").id(2).at_millis(1_500).build();
    chain.process_message(&mut later);
    let emitted = chain.take_emitted();

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].dns.qname, "lost.example.com");
    assert_eq!(emitted[0].dns.rcode, "TIMEOUT");
}

#[test]
fn test_latency_feeds_suspicious_slow_flag() {
    let mut config = TransformsConfig::default();
    config.latency.enable = true;
    config.latency.measure_latency = true;
    config.latency.queries_timeout_secs = 10;
    config.suspicious.enable = true;
    let mut chain = chain(config);

    let mut query = MessageBuilder::query("example.com").at_millis(0).build();
    chain.process_message(&mut query);

    let mut reply = MessageBuilder::reply("example.com").at_millis(1_500).build();
    chain.init_message_format(&mut reply);
    chain.process_message(&mut reply);

    assert!((reply.timing.latency - 1.5).abs() < 1e-9);
    assert!(reply.suspicious.unwrap().slow_domain);
}

#[test]
fn test_malformed_message_is_kept_unless_rule_excludes_it() {
    let mut config = TransformsConfig::default();
    config.filtering.enable = true;
    let mut chain = chain(config.clone());

    let mut msg = MessageBuilder::query("-").malformed().build();
    assert_eq!(chain.process_message(&mut msg), StageOutcome::Continue);

    config.filtering.drop_malformed = true;
    chain.reload_config(Arc::new(config));
    let mut msg = MessageBuilder::query("-").malformed().build();
    assert_eq!(chain.process_message(&mut msg), StageOutcome::Drop);
}
