//! 访问追踪
//!
//! 请求路径只负责把事件放进有界队列；解析、地理定位和写日志都由
//! 后台 worker 完成，失败只记录日志。访问计数不走这里。

pub mod processor;
pub mod sink;
pub mod tracker;

pub use processor::AccessLogProcessor;
pub use sink::{AccessLogSink, StorageAccessSink};
pub use tracker::AccessTracker;

use chrono::{DateTime, Utc};

use crate::storage::AccessMode;

/// 一次成功的内容访问
#[derive(Debug, Clone)]
pub struct AccessEvent {
    pub share_link_id: String,
    /// 客户端地址（原样，可带端口或为转发头列表）
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub access_method: AccessMode,
    pub authenticated_user_id: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

impl AccessEvent {
    pub fn new(share_link_id: impl Into<String>) -> Self {
        Self {
            share_link_id: share_link_id.into(),
            ip_address: String::new(),
            user_agent: None,
            referrer: None,
            access_method: AccessMode::Public,
            authenticated_user_id: None,
            accessed_at: Utc::now(),
        }
    }

    pub fn with_client(
        mut self,
        ip_address: impl Into<String>,
        user_agent: Option<String>,
        referrer: Option<String>,
    ) -> Self {
        self.ip_address = ip_address.into();
        self.user_agent = user_agent;
        self.referrer = referrer.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_auth(mut self, access_method: AccessMode, user_id: Option<String>) -> Self {
        self.access_method = access_method;
        self.authenticated_user_id = user_id;
        self
    }
}
