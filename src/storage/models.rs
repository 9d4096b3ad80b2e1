use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{Result, ShareLinkError};

/// 访问策略
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    #[default]
    Public,
    LoginRequired,
}

/// 被分享的资源类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Record,
    Dashboard,
    Chart,
}

/// 被分享的资源引用，id 对本 crate 不透明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resourceType", content = "resourceId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedResource {
    Record(String),
    Dashboard(String),
    Chart(String),
}

impl SharedResource {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        let id = id.into();
        match kind {
            ResourceKind::Record => SharedResource::Record(id),
            ResourceKind::Dashboard => SharedResource::Dashboard(id),
            ResourceKind::Chart => SharedResource::Chart(id),
        }
    }

    /// 从存储中的 (resource_type, resource_id) 还原
    pub fn from_parts(resource_type: &str, resource_id: &str) -> Result<Self> {
        let kind: ResourceKind = resource_type.parse().map_err(|_| {
            ShareLinkError::validation(format!("Unknown resource type: {}", resource_type))
        })?;
        if resource_id.trim().is_empty() {
            return Err(ShareLinkError::validation("Resource id must not be empty"));
        }
        Ok(Self::new(kind, resource_id))
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            SharedResource::Record(_) => ResourceKind::Record,
            SharedResource::Dashboard(_) => ResourceKind::Dashboard,
            SharedResource::Chart(_) => ResourceKind::Chart,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SharedResource::Record(id) | SharedResource::Dashboard(id) | SharedResource::Chart(id) => {
                id
            }
        }
    }
}

/// 分享链接快照（存储、缓存与校验共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: String,
    pub token: String,
    pub workspace_id: String,
    pub resource: SharedResource,
    pub created_by_id: String,
    pub access_mode: AccessMode,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub inactivity_expiration_days: Option<u32>,
    #[serde(default)]
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShareLink {
    /// 不活跃过期的计时起点
    pub fn activity_anchor(&self) -> DateTime<Utc> {
        self.last_accessed_at.unwrap_or(self.created_at)
    }

    /// 缓存 TTL：默认值与剩余有效期取较小者
    pub fn cache_ttl(&self, default_ttl: Duration, now: DateTime<Utc>) -> Duration {
        match self.expires_at {
            Some(expires_at) if expires_at <= now => Duration::from_secs(1),
            Some(expires_at) => {
                let remaining = (expires_at - now).num_seconds().max(1) as u64;
                Duration::from_secs(remaining.min(default_ttl.as_secs()))
            }
            None => default_ttl,
        }
    }

    pub fn to_view(&self) -> ShareLinkView {
        ShareLinkView::from(self)
    }
}

/// 对外返回的链接视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkView {
    pub id: String,
    pub token: String,
    pub access_mode: AccessMode,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub inactivity_expiration_days: Option<u32>,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ShareLink> for ShareLinkView {
    fn from(link: &ShareLink) -> Self {
        Self {
            id: link.id.clone(),
            token: link.token.clone(),
            access_mode: link.access_mode,
            is_active: link.is_active,
            expires_at: link.expires_at,
            inactivity_expiration_days: link.inactivity_expiration_days,
            access_count: link.access_count,
            last_accessed_at: link.last_accessed_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// 链接设置的局部更新
///
/// 外层 `None` 表示不修改；`Some(None)` 表示清空该字段。
#[derive(Debug, Clone, Default)]
pub struct ShareLinkPatch {
    pub access_mode: Option<AccessMode>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub inactivity_expiration_days: Option<Option<u32>>,
}

impl ShareLinkPatch {
    pub fn is_empty(&self) -> bool {
        self.access_mode.is_none()
            && self.is_active.is_none()
            && self.expires_at.is_none()
            && self.inactivity_expiration_days.is_none()
    }
}

/// 设备类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

/// 待写入的访问日志
#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub share_link_id: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub browser_name: Option<String>,
    pub operating_system: Option<String>,
    pub is_bot: bool,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub access_method: AccessMode,
    pub authenticated_user_id: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

/// 已存储的访问日志
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLogRecord {
    pub id: i64,
    pub share_link_id: String,
    pub ip_address: String,
    pub device_type: DeviceType,
    pub browser_name: Option<String>,
    pub operating_system: Option<String>,
    pub is_bot: bool,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub access_method: AccessMode,
    pub authenticated_user_id: Option<String>,
    pub session_duration_seconds: u32,
    pub accessed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_link() -> ShareLink {
        let now = Utc::now();
        ShareLink {
            id: "id-1".to_string(),
            token: "t".repeat(43),
            workspace_id: "ws".to_string(),
            resource: SharedResource::Dashboard("dash-1".to_string()),
            created_by_id: "user".to_string(),
            access_mode: AccessMode::Public,
            is_active: true,
            expires_at: None,
            inactivity_expiration_days: None,
            access_count: 0,
            last_accessed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_mode_strings() {
        assert_eq!(AccessMode::Public.as_ref(), "PUBLIC");
        assert_eq!(AccessMode::LoginRequired.as_ref(), "LOGIN_REQUIRED");
        assert_eq!(
            "LOGIN_REQUIRED".parse::<AccessMode>().unwrap(),
            AccessMode::LoginRequired
        );
        assert!("login".parse::<AccessMode>().is_err());
    }

    #[test]
    fn test_shared_resource_from_parts() {
        let res = SharedResource::from_parts("RECORD", "rec-9").unwrap();
        assert_eq!(res, SharedResource::Record("rec-9".to_string()));
        assert_eq!(res.kind(), ResourceKind::Record);
        assert_eq!(res.id(), "rec-9");

        assert!(SharedResource::from_parts("SPREADSHEET", "x").is_err());
        assert!(SharedResource::from_parts("CHART", "  ").is_err());
    }

    #[test]
    fn test_cache_ttl_capped_by_expiry() {
        let now = Utc::now();
        let default_ttl = Duration::from_secs(300);
        let mut link = sample_link();

        assert_eq!(link.cache_ttl(default_ttl, now), default_ttl);

        link.expires_at = Some(now + chrono::Duration::seconds(60));
        assert_eq!(link.cache_ttl(default_ttl, now), Duration::from_secs(60));

        link.expires_at = Some(now + chrono::Duration::hours(2));
        assert_eq!(link.cache_ttl(default_ttl, now), default_ttl);

        link.expires_at = Some(now - chrono::Duration::seconds(5));
        assert_eq!(link.cache_ttl(default_ttl, now), Duration::from_secs(1));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let link = sample_link();
        let json = serde_json::to_value(link.to_view()).unwrap();
        assert_eq!(json["accessMode"], "PUBLIC");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["accessCount"], 0);
        assert!(json.get("inactivityExpirationDays").is_some());
        assert!(json.get("workspaceId").is_none());
    }

    #[test]
    fn test_activity_anchor() {
        let mut link = sample_link();
        assert_eq!(link.activity_anchor(), link.created_at);
        let later = link.created_at + chrono::Duration::days(2);
        link.last_accessed_at = Some(later);
        assert_eq!(link.activity_anchor(), later);
    }
}
