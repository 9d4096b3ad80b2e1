//! Share link lifecycle service
//!
//! Create-or-reuse, owner-scoped update/delete, queries and the access
//! tracking hook. Every write path evicts the token from the cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, warn};

use crate::cache::ShareLinkLookup;
use crate::config::ShareConfig;
use crate::errors::{Result, ShareLinkError};
use crate::services::validation::is_live;
use crate::storage::{
    AccessMode, InsertOutcome, SeaOrmStorage, ShareLink, ShareLinkPatch, SharedResource,
};
use crate::utils::generate_token;

// ============ Request/Response DTOs ============

/// Request to share a resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareLinkRequest {
    pub workspace_id: String,
    pub created_by_id: String,
    pub resource: SharedResource,
    #[serde(default)]
    pub access_mode: AccessMode,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inactivity_expiration_days: Option<u32>,
}

/// Request to change an existing link
///
/// Absent fields are kept; an explicit `null` clears `expiresAt` or
/// `inactivityExpirationDays`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShareLinkRequest {
    #[serde(default)]
    pub access_mode: Option<AccessMode>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub inactivity_expiration_days: Option<Option<u32>>,
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateShareLinkRequest> for ShareLinkPatch {
    fn from(req: UpdateShareLinkRequest) -> Self {
        ShareLinkPatch {
            access_mode: req.access_mode,
            is_active: req.is_active,
            expires_at: req.expires_at,
            inactivity_expiration_days: req.inactivity_expiration_days,
        }
    }
}

/// Result of link creation
#[derive(Debug, Clone)]
pub struct ShareLinkCreateResult {
    pub link: ShareLink,
    /// A live link for the same owner and resource was reused
    pub reused: bool,
}

// ============ ShareLinkService Implementation ============

pub struct ShareLinkService {
    storage: Arc<SeaOrmStorage>,
    lookup: ShareLinkLookup,
    share: ShareConfig,
}

impl ShareLinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, lookup: ShareLinkLookup, share: ShareConfig) -> Self {
        Self {
            storage,
            lookup,
            share,
        }
    }

    fn check_threshold(&self, days: Option<u32>) -> Result<()> {
        match days {
            Some(d) if !self.share.is_allowed_threshold(d) => {
                Err(ShareLinkError::validation(format!(
                    "inactivityExpirationDays must be one of {:?}, got {}",
                    self.share.allowed_inactivity_days, d
                )))
            }
            _ => Ok(()),
        }
    }

    /// 查询结果必须属于调用方所在的 workspace
    fn ensure_workspace(link: &ShareLink, workspace_id: &str) -> Result<()> {
        if link.workspace_id != workspace_id {
            error!(
                "Workspace isolation anomaly: link {} belongs to {}, requested from {}",
                link.id, link.workspace_id, workspace_id
            );
            return Err(ShareLinkError::workspace_mismatch(format!(
                "Share link {} does not belong to workspace {}",
                link.id, workspace_id
            )));
        }
        Ok(())
    }

    // ============ Lifecycle Operations ============

    /// 复用同一 (workspace, resource, creator) 下仍然有效的链接，否则新建
    pub async fn create_share_link(
        &self,
        req: CreateShareLinkRequest,
    ) -> Result<ShareLinkCreateResult> {
        if req.workspace_id.trim().is_empty() || req.created_by_id.trim().is_empty() {
            return Err(ShareLinkError::validation(
                "workspaceId and createdById are required",
            ));
        }
        if req.resource.id().trim().is_empty() {
            return Err(ShareLinkError::validation("resourceId is required"));
        }
        self.check_threshold(req.inactivity_expiration_days)?;

        let now = Utc::now();

        if let Some(existing) = self
            .find_live(&req.workspace_id, &req.resource, &req.created_by_id, now)
            .await?
        {
            if let Some(result) = self.reuse(existing, &req, now).await? {
                return Ok(result);
            }
        }

        let link = self.insert_with_fresh_token(&req, now).await?;
        info!(
            "ShareLinkService: created share link {} for {} {}",
            link.id,
            link.resource.kind(),
            link.resource.id()
        );
        Ok(ShareLinkCreateResult {
            link,
            reused: false,
        })
    }

    async fn find_live(
        &self,
        workspace_id: &str,
        resource: &SharedResource,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ShareLink>> {
        let candidates = self
            .storage
            .find_by_owner_resource(workspace_id, resource, user_id)
            .await?;

        match candidates.into_iter().find(|l| is_live(l, now)) {
            Some(link) => {
                Self::ensure_workspace(&link, workspace_id)?;
                Ok(Some(link))
            }
            None => Ok(None),
        }
    }

    /// 链接在读取后被并发停用时返回 `None`，由调用方新建
    async fn reuse(
        &self,
        existing: ShareLink,
        req: &CreateShareLinkRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<ShareLinkCreateResult>> {
        let patch = ShareLinkPatch {
            access_mode: Some(req.access_mode),
            is_active: None,
            expires_at: Some(req.expires_at),
            inactivity_expiration_days: Some(req.inactivity_expiration_days),
        };

        let patched = self
            .storage
            .apply_patch_if_active(&existing.id, &patch, now)
            .await?;
        self.lookup.invalidate(&existing.token).await;
        if !patched {
            debug!(
                "ShareLinkService: share link {} was deactivated before reuse",
                existing.id
            );
            return Ok(None);
        }

        let link = self.storage.find_by_id(&existing.id).await?.ok_or_else(|| {
            ShareLinkError::link_not_found(format!(
                "Share link {} vanished while being reused",
                existing.id
            ))
        })?;

        debug!("ShareLinkService: reused share link {}", link.id);
        Ok(Some(ShareLinkCreateResult { link, reused: true }))
    }

    /// 预检查只是优化，唯一索引冲突才是真正的重试条件
    async fn insert_with_fresh_token(
        &self,
        req: &CreateShareLinkRequest,
        now: DateTime<Utc>,
    ) -> Result<ShareLink> {
        let max_attempts = self.share.max_token_attempts.max(1);

        for attempt in 1..=max_attempts {
            let token = generate_token();
            if self.storage.token_exists(&token).await? {
                warn!("Generated token already exists (attempt {})", attempt);
                continue;
            }

            let link = ShareLink {
                id: uuid::Uuid::new_v4().to_string(),
                token,
                workspace_id: req.workspace_id.clone(),
                resource: req.resource.clone(),
                created_by_id: req.created_by_id.clone(),
                access_mode: req.access_mode,
                is_active: true,
                expires_at: req.expires_at,
                inactivity_expiration_days: req.inactivity_expiration_days,
                access_count: 0,
                last_accessed_at: None,
                created_at: now,
                updated_at: now,
            };

            match self.storage.insert_link(&link).await? {
                InsertOutcome::Inserted => return Ok(link),
                InsertOutcome::TokenConflict => {
                    warn!("Token collided on insert (attempt {})", attempt);
                }
            }
        }

        Err(ShareLinkError::database_operation(format!(
            "Could not allocate a unique token after {} attempts",
            max_attempts
        )))
    }

    pub async fn update_share_link(
        &self,
        token: &str,
        workspace_id: &str,
        user_id: &str,
        req: UpdateShareLinkRequest,
    ) -> Result<ShareLink> {
        if let Some(days) = req.inactivity_expiration_days {
            self.check_threshold(days)?;
        }
        let patch = ShareLinkPatch::from(req);

        let updated = self
            .storage
            .update_owned(token, workspace_id, user_id, &patch, Utc::now())
            .await?;
        self.lookup.invalidate(token).await;

        let link = updated.ok_or_else(|| {
            ShareLinkError::not_found_or_forbidden("Share link not found or not owned by caller")
        })?;
        Self::ensure_workspace(&link, workspace_id)?;

        info!("ShareLinkService: updated share link {}", link.id);
        Ok(link)
    }

    pub async fn delete_share_link(
        &self,
        token: &str,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let deleted = self
            .storage
            .delete_owned(token, workspace_id, user_id)
            .await?;
        self.lookup.invalidate(token).await;

        if !deleted {
            return Err(ShareLinkError::not_found_or_forbidden(
                "Share link not found or not owned by caller",
            ));
        }
        Ok(true)
    }

    // ============ Queries ============

    pub async fn find_share_links_by_user(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Vec<ShareLink>> {
        let links = self.storage.list_by_user(workspace_id, user_id).await?;
        for link in &links {
            Self::ensure_workspace(link, workspace_id)?;
        }
        Ok(links)
    }

    /// 当前仍有效的链接（如果有）
    pub async fn find_active_share_link(
        &self,
        workspace_id: &str,
        resource: &SharedResource,
        user_id: &str,
    ) -> Result<Option<ShareLink>> {
        self.find_live(workspace_id, resource, user_id, Utc::now())
            .await
    }

    // ============ Access Tracking ============

    /// 访问计数 + 1 并刷新最后访问时间，不重新校验
    pub async fn track_access(&self, token: &str) -> Result<bool> {
        let touched = self.storage.record_access(token, Utc::now()).await?;
        self.lookup.invalidate(token).await;
        Ok(touched)
    }
}
