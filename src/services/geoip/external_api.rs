//! 外部 HTTP GeoIP 查询（默认 ip-api.com）

use std::net::IpAddr;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoInfo, GeoIpLookup};

const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
const HTTP_TIMEOUT_SECS: u64 = 2;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// 结果（包括失败的 None）按 IP 缓存 15 分钟；同一 IP 的并发查询只发一次请求
pub struct ExternalApiProvider {
    /// 使用 `{ip}` 作为占位符
    api_url_template: String,
    cache: Cache<IpAddr, Option<GeoInfo>>,
}

impl ExternalApiProvider {
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    fn fetch_sync(url: String) -> Option<GeoInfo> {
        let resp = match get_agent().get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return None;
            }
        };

        match resp.into_body().read_json::<serde_json::Value>() {
            Ok(json) => parse_geo_response(&json),
            Err(e) => {
                warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
                None
            }
        }
    }
}

/// 兼容 ip-api.com 及常见的字段命名
pub(crate) fn parse_geo_response(json: &serde_json::Value) -> Option<GeoInfo> {
    if json["status"].as_str() == Some("fail") {
        return None;
    }

    let country_code = json["countryCode"]
        .as_str()
        .or_else(|| json["country_code"].as_str())
        .map(String::from);
    let city = json["city"]
        .as_str()
        .filter(|c| !c.is_empty())
        .map(String::from);

    if country_code.is_none() && city.is_none() {
        return None;
    }
    Some(GeoInfo { country_code, city })
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    async fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
        self.cache
            .get_with(ip, async {
                trace!("GeoIP cache miss for {}, fetching from API", ip);
                let url = self.api_url_template.replace("{ip}", &ip.to_string());
                tokio::task::spawn_blocking(move || Self::fetch_sync(url))
                    .await
                    .unwrap_or_else(|e| {
                        warn!("GeoIP spawn_blocking failed: {}", e);
                        None
                    })
            })
            .await
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
