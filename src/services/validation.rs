//! 分享链接校验
//!
//! 检查顺序固定，先失败者胜出：格式、存在性、停用、绝对过期、不活跃过期。

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::ShareLinkLookup;
use crate::errors::{Result, ShareLinkError};
use crate::storage::ShareLink;

/// 仅检查格式，不做任何 I/O
pub fn check_format(token: &str, min_length: usize) -> Result<()> {
    if token.is_empty() {
        return Err(ShareLinkError::invalid_token("Token is empty"));
    }
    if token.len() < min_length {
        return Err(ShareLinkError::invalid_token(format!(
            "Token shorter than {} characters",
            min_length
        )));
    }
    Ok(())
}

/// 对快照求值（纯函数）
pub fn evaluate_link(link: &ShareLink, now: DateTime<Utc>) -> Result<()> {
    if !link.is_active {
        return Err(ShareLinkError::link_disabled(format!(
            "Share link {} is disabled",
            link.id
        )));
    }

    if let Some(expires_at) = link.expires_at
        && now > expires_at
    {
        return Err(ShareLinkError::link_expired(format!(
            "Share link {} expired at {}",
            link.id,
            expires_at.to_rfc3339()
        )));
    }

    if let Some(days) = link.inactivity_expiration_days {
        let idle_days = (now - link.activity_anchor()).num_days();
        if idle_days >= i64::from(days) {
            return Err(ShareLinkError::link_inactive_expired(format!(
                "Share link {} idle for {} days (limit {})",
                link.id, idle_days, days
            )));
        }
    }

    Ok(())
}

/// 快照当前是否可用
pub fn is_live(link: &ShareLink, now: DateTime<Utc>) -> bool {
    evaluate_link(link, now).is_ok()
}

/// token 到有效链接的解析器
#[derive(Clone)]
pub struct ShareLinkValidator {
    lookup: ShareLinkLookup,
    min_token_length: usize,
}

impl ShareLinkValidator {
    pub fn new(lookup: ShareLinkLookup, min_token_length: usize) -> Self {
        Self {
            lookup,
            min_token_length,
        }
    }

    pub async fn validate(&self, token: &str) -> Result<ShareLink> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<ShareLink> {
        check_format(token, self.min_token_length)?;

        let link = self
            .lookup
            .get(token)
            .await?
            .ok_or_else(|| ShareLinkError::link_not_found("No share link for token"))?;

        if let Err(e) = evaluate_link(&link, now) {
            debug!("Share link {} rejected: {}", link.id, e.code());
            return Err(e);
        }

        Ok(link)
    }
}
