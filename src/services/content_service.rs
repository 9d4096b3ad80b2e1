//! External shared-content path
//!
//! Resolves a token to a live link, applies the access-mode gate, asks the
//! content provider for the resource, records the access on the link and
//! enqueues the analytics event. Callers only ever see a [`PublicShareError`]
//! bucket.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::analytics::{AccessEvent, AccessTracker};
use crate::errors::{PublicShareError, Result, ShareLinkError};
use crate::services::{AuthVerifier, ShareLinkService, ShareLinkValidator};
use crate::storage::{AccessMode, ResourceKind, ShareLink, SharedResource};

/// 资源内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceContent {
    pub title: String,
    pub data: serde_json::Value,
}

/// 把 (resource, workspace) 变成可展示内容，由宿主注入
///
/// 资源不存在（或不属于该 workspace）时返回 `Ok(None)`。
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn get_content(
        &self,
        resource: &SharedResource,
        workspace_id: &str,
    ) -> anyhow::Result<Option<ResourceContent>>;
}

/// 访问者信息
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedContentMetadata {
    pub access_mode: AccessMode,
    pub expires_at: Option<DateTime<Utc>>,
    pub shared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedContent {
    pub resource_type: ResourceKind,
    pub resource_id: String,
    pub title: String,
    pub data: serde_json::Value,
    pub metadata: SharedContentMetadata,
}

pub struct SharedContentService {
    validator: ShareLinkValidator,
    links: Arc<ShareLinkService>,
    verifier: Arc<dyn AuthVerifier>,
    provider: Arc<dyn ContentProvider>,
    tracker: Option<AccessTracker>,
}

impl SharedContentService {
    pub fn new(
        validator: ShareLinkValidator,
        links: Arc<ShareLinkService>,
        verifier: Arc<dyn AuthVerifier>,
        provider: Arc<dyn ContentProvider>,
        tracker: Option<AccessTracker>,
    ) -> Self {
        Self {
            validator,
            links,
            verifier,
            provider,
            tracker,
        }
    }

    /// 对外入口：细粒度原因只写日志
    pub async fn get_shared_content(
        &self,
        token: &str,
        auth_token: Option<&str>,
        client: ClientInfo,
    ) -> std::result::Result<SharedContent, PublicShareError> {
        self.resolve(token, auth_token, client).await.map_err(|e| {
            match e.public_error() {
                PublicShareError::Internal => error!("Shared content failed: {}", e),
                _ => debug!("Shared content rejected: {}", e.format_simple()),
            }
            e.public_error()
        })
    }

    /// 内部入口，保留具体错误类型
    pub async fn resolve(
        &self,
        token: &str,
        auth_token: Option<&str>,
        client: ClientInfo,
    ) -> Result<SharedContent> {
        let link = self.validator.validate(token).await?;
        let user_id = self.authorize(&link, auth_token).await?;

        // workspace 只从链接本身推导
        let content = self
            .provider
            .get_content(&link.resource, &link.workspace_id)
            .await
            .map_err(|e| ShareLinkError::content_provider(e.to_string()))?
            .ok_or_else(|| {
                ShareLinkError::resource_not_found(format!(
                    "{} {} not found in workspace {}",
                    link.resource.kind(),
                    link.resource.id(),
                    link.workspace_id
                ))
            })?;

        self.record_access(&link).await;
        self.enqueue_access(&link, user_id, client);

        Ok(SharedContent {
            resource_type: link.resource.kind(),
            resource_id: link.resource.id().to_string(),
            title: content.title,
            data: content.data,
            metadata: SharedContentMetadata {
                access_mode: link.access_mode,
                expires_at: link.expires_at,
                shared_at: link.created_at,
            },
        })
    }

    async fn authorize(&self, link: &ShareLink, auth_token: Option<&str>) -> Result<Option<String>> {
        let credential = auth_token.map(str::trim).filter(|t| !t.is_empty());

        match (link.access_mode, credential) {
            (AccessMode::Public, _) => Ok(None),
            (AccessMode::LoginRequired, None) => Err(ShareLinkError::auth_required(format!(
                "Share link {} requires authentication",
                link.id
            ))),
            (AccessMode::LoginRequired, Some(credential)) => {
                let user = self.verifier.verify(credential).await.map_err(|e| match e {
                    ShareLinkError::AuthInvalid(_) => e,
                    other => ShareLinkError::auth_invalid(other.message().to_string()),
                })?;
                Ok(Some(user.user_id))
            }
        }
    }

    /// 计数与 last_accessed_at 不经过分析队列，失败只记录
    async fn record_access(&self, link: &ShareLink) {
        match self.links.track_access(&link.token).await {
            Ok(true) => {}
            Ok(false) => warn!("Share link {} vanished before its access was recorded", link.id),
            Err(e) => warn!("Failed to record access for share link {}: {}", link.id, e),
        }
    }

    fn enqueue_access(&self, link: &ShareLink, user_id: Option<String>, client: ClientInfo) {
        let Some(tracker) = &self.tracker else {
            return;
        };

        let event = AccessEvent::new(&link.id)
            .with_client(client.ip_address, client.user_agent, client.referrer)
            .with_auth(link.access_mode, user_id);
        if !tracker.log_access(event) {
            warn!("Access to share link {} was not logged", link.id);
        }
    }
}
