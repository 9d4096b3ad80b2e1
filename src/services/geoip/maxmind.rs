//! 本地 GeoLite2-City.mmdb 查询

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoInfo, GeoIpLookup};

pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    pub fn new(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        let result = self.reader.lookup(ip).ok()?;
        let record: maxminddb::geoip2::City = result.decode().ok()??;

        let country_code = record.country.iso_code.map(String::from);
        let city = record.city.names.english.map(|s| s.to_string());

        trace!("MaxMind {}: country={:?}, city={:?}", ip, country_code, city);

        Some(GeoInfo { country_code, city })
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
