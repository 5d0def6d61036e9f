use ferrous_collector_domain::{DomainError, GeoInfo, GeoIpConfig};
use std::net::IpAddr;
use std::sync::Arc;

/// Opens the read-only lookup handle shared by every pipeline instance.
pub trait GeoIpProvider: Send + Sync {
    fn open(&self, config: &GeoIpConfig) -> Result<Arc<dyn GeoIpLookup>, DomainError>;
}

pub trait GeoIpLookup: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> Result<GeoInfo, DomainError>;
}
