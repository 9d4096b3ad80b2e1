//! 过期链接清理任务
//!
//! 每一轮依次执行：
//! 1. 绝对过期：停用 expires_at 已过的激活链接
//! 2. 不活跃过期：按每个阈值停用长期未访问的激活链接
//! 3. 访问日志保留期清理
//!
//! 每次停用都是带条件的 UPDATE，重复执行或并发执行都是安全的。

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::cache::ShareLinkLookup;
use crate::errors::{Result, ShareLinkError};
use crate::services::AnalyticsService;
use crate::storage::{SeaOrmStorage, ShareLink};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub expired_deactivated: u64,
    pub inactive_deactivated: u64,
    pub access_logs_deleted: u64,
}

pub struct ShareLinkCleanupTask {
    storage: Arc<SeaOrmStorage>,
    lookup: ShareLinkLookup,
    analytics: Arc<AnalyticsService>,
    thresholds: Vec<u32>,
    retention_days: u32,
}

impl ShareLinkCleanupTask {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        lookup: ShareLinkLookup,
        analytics: Arc<AnalyticsService>,
        thresholds: Vec<u32>,
        retention_days: u32,
    ) -> Self {
        Self {
            storage,
            lookup,
            analytics,
            thresholds,
            retention_days,
        }
    }

    /// 执行一轮清理；单个阶段失败只记录日志
    pub async fn run_once(&self, now: DateTime<Utc>) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.deactivate_expired(now).await {
            Ok(n) => report.expired_deactivated = n,
            Err(e) => error!("Absolute expiry pass failed: {}", e),
        }

        for &days in &self.thresholds {
            match self.deactivate_inactive(days, now).await {
                Ok(n) => report.inactive_deactivated += n,
                Err(e) => error!("Inactivity pass ({}d) failed: {}", days, e),
            }
        }

        match self
            .analytics
            .cleanup_old_access_logs(self.retention_days)
            .await
        {
            Ok(n) => report.access_logs_deleted = n,
            Err(e) => error!("Access log retention purge failed: {}", e),
        }

        info!(
            "Share link cleanup finished: {} expired, {} inactive, {} access logs purged",
            report.expired_deactivated, report.inactive_deactivated, report.access_logs_deleted
        );
        report
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let links = self.storage.find_expired_active(now).await?;
        self.deactivate_all(links, now).await
    }

    async fn deactivate_inactive(&self, days: u32, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = Duration::try_days(i64::from(days))
            .and_then(|idle| now.checked_sub_signed(idle))
            .ok_or_else(|| {
                ShareLinkError::validation(format!("Invalid inactivity threshold: {} days", days))
            })?;
        let links = self.storage.find_inactive_for_threshold(days, cutoff).await?;
        self.deactivate_all(links, now).await
    }

    async fn deactivate_all(&self, links: Vec<ShareLink>, now: DateTime<Utc>) -> Result<u64> {
        let mut deactivated = 0u64;
        for link in links {
            if self.storage.deactivate_if_active(&link.id, now).await? {
                deactivated += 1;
                debug!("Deactivated share link {}", link.id);
            }
            // 即使已被别人停用，也确保缓存里没有旧快照
            self.lookup.invalidate(&link.token).await;
        }
        Ok(deactivated)
    }

    /// 启动后台定时任务
    pub fn spawn_background_task(
        self: Arc<Self>,
        interval_hours: u64,
        initial_delay_secs: u64,
    ) -> tokio::task::JoinHandle<()> {
        let interval = StdDuration::from_secs(interval_hours.max(1) * 60 * 60);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_secs(initial_delay_secs)).await;

            loop {
                self.run_once(Utc::now()).await;
                tokio::time::sleep(interval).await;
            }
        });

        info!(
            "Share link cleanup task started (interval: {} hours)",
            interval_hours.max(1)
        );
        handle
    }
}
