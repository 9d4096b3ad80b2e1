use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::external_api::ExternalApiProvider;
use super::maxmind::MaxMindProvider;
use crate::config::AnalyticsConfig;
use crate::utils::is_private_or_local;

/// 地理位置信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 (e.g., "CN", "US")
    pub country_code: Option<String>,
    pub city: Option<String>,
}

#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> Option<GeoInfo>;

    fn name(&self) -> &'static str;
}

/// 关闭地理解析时使用
pub struct DisabledGeoIp;

#[async_trait]
impl GeoIpLookup for DisabledGeoIp {
    async fn lookup(&self, _ip: IpAddr) -> Option<GeoInfo> {
        None
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// 统一入口，启动时按配置选择实现
#[derive(Clone)]
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let inner: Arc<dyn GeoIpLookup> = if !config.geoip_enabled {
            debug!("GeoIP: disabled by configuration");
            Arc::new(DisabledGeoIp)
        } else if let Some(ref path) = config.maxminddb_path {
            match MaxMindProvider::new(path) {
                Ok(provider) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, falling back to external API",
                        path, e
                    );
                    Arc::new(ExternalApiProvider::new(&config.geoip_api_url))
                }
            }
        } else {
            Arc::new(ExternalApiProvider::new(&config.geoip_api_url))
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Self { inner }
    }

    pub fn from_lookup(inner: Arc<dyn GeoIpLookup>) -> Self {
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self::from_lookup(Arc::new(DisabledGeoIp))
    }

    /// 私有/本地地址不查询
    pub async fn lookup(&self, ip: IpAddr) -> GeoInfo {
        if is_private_or_local(&ip) {
            return GeoInfo::default();
        }
        self.inner.lookup(ip).await.unwrap_or_default()
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeoIpLookup for CountingLookup {
        async fn lookup(&self, _ip: IpAddr) -> Option<GeoInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Some(GeoInfo {
                country_code: Some("DE".to_string()),
                city: Some("Berlin".to_string()),
            })
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_private_addresses_are_not_resolved() {
        let inner = Arc::new(CountingLookup {
            calls: AtomicUsize::new(0),
        });
        let provider = GeoIpProvider::from_lookup(inner.clone());

        let geo = provider.lookup("192.168.1.10".parse().unwrap()).await;
        assert_eq!(geo, GeoInfo::default());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);

        let geo = provider.lookup("203.0.113.9".parse().unwrap()).await;
        assert_eq!(geo.country_code.as_deref(), Some("DE"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_by_config() {
        let config = AnalyticsConfig {
            geoip_enabled: false,
            ..Default::default()
        };
        let provider = GeoIpProvider::new(&config);
        assert_eq!(provider.provider_name(), "disabled");
        assert_eq!(
            provider.lookup("8.8.8.8".parse().unwrap()).await,
            GeoInfo::default()
        );
    }
}
