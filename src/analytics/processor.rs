use std::sync::Arc;

use tracing::{trace, warn};

use super::{AccessEvent, AccessLogSink};
use crate::services::{GeoInfo, GeoIpProvider, UserAgentParser};
use crate::storage::NewAccessLog;
use crate::utils::parse_client_ip;

/// 把访问事件加工成访问日志并落地
pub struct AccessLogProcessor {
    sink: Arc<dyn AccessLogSink>,
    geoip: GeoIpProvider,
    user_agents: UserAgentParser,
}

impl AccessLogProcessor {
    pub fn new(sink: Arc<dyn AccessLogSink>, geoip: GeoIpProvider) -> Self {
        Self {
            sink,
            geoip,
            user_agents: UserAgentParser::new(),
        }
    }

    pub async fn build_log(&self, event: &AccessEvent) -> NewAccessLog {
        let parsed_ip = parse_client_ip(&event.ip_address);
        let geo = match parsed_ip {
            Some(ip) => self.geoip.lookup(ip).await,
            None => GeoInfo::default(),
        };
        let ua = self.user_agents.parse(event.user_agent.as_deref());

        NewAccessLog {
            share_link_id: event.share_link_id.clone(),
            ip_address: parsed_ip
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| event.ip_address.trim().to_string()),
            device_type: ua.device_type,
            browser_name: ua.browser_name,
            operating_system: ua.operating_system,
            is_bot: ua.is_bot,
            country_code: geo.country_code,
            city: geo.city,
            referrer: event.referrer.clone(),
            access_method: event.access_method,
            authenticated_user_id: event.authenticated_user_id.clone(),
            accessed_at: event.accessed_at,
        }
    }

    /// 所有错误只记录，不向上传播
    pub async fn process(&self, event: AccessEvent) {
        let log = self.build_log(&event).await;

        match self.sink.write_access_log(log).await {
            Ok(id) => trace!("Access log {} written for {}", id, event.share_link_id),
            Err(e) => warn!(
                "Failed to write access log for {}: {}",
                event.share_link_id, e
            ),
        }
    }
}
