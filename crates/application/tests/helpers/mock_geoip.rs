#![allow(dead_code)]

use ferrous_collector_application::ports::{GeoIpLookup, GeoIpProvider};
use ferrous_collector_domain::{DomainError, GeoInfo, GeoIpConfig};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct MockGeoIpLookup {
    entries: HashMap<IpAddr, GeoInfo>,
}

impl GeoIpLookup for MockGeoIpLookup {
    fn lookup(&self, ip: IpAddr) -> Result<GeoInfo, DomainError> {
        self.entries
            .get(&ip)
            .cloned()
            .ok_or_else(|| DomainError::GeoIpLookup {
                ip: ip.to_string(),
                reason: "address not found".to_string(),
            })
    }
}

#[derive(Default)]
pub struct MockGeoIpProvider {
    entries: HashMap<IpAddr, GeoInfo>,
    opened: AtomicUsize,
}

impl MockGeoIpProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, ip: &str, country: &str) -> Self {
        self.entries.insert(
            ip.parse().unwrap(),
            GeoInfo {
                country_iso_code: country.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl GeoIpProvider for MockGeoIpProvider {
    fn open(&self, _config: &GeoIpConfig) -> Result<Arc<dyn GeoIpLookup>, DomainError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockGeoIpLookup {
            entries: self.entries.clone(),
        }))
    }
}

pub struct FailingGeoIpProvider;

impl GeoIpProvider for FailingGeoIpProvider {
    fn open(&self, config: &GeoIpConfig) -> Result<Arc<dyn GeoIpLookup>, DomainError> {
        Err(DomainError::GeoIpUnavailable(
            config
                .mmdb_country_file
                .clone()
                .unwrap_or_else(|| "no database configured".to_string()),
        ))
    }
}
