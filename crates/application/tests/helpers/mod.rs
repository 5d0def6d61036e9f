mod builders;
mod mock_geoip;

pub use builders::MessageBuilder;
pub use mock_geoip::{FailingGeoIpProvider, MockGeoIpProvider};
