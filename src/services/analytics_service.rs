//! Access analytics service
//!
//! Aggregation is a pure function over stored access logs; the service only
//! loads the window and delegates.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::{Result, ShareLinkError};
use crate::storage::{AccessLogRecord, SeaOrmStorage};

/// 批量删除大小
const PURGE_BATCH_SIZE: u64 = 5000;
/// 单次报表允许的最大窗口（天）
pub const MAX_WINDOW_DAYS: u32 = 366;
const UNKNOWN: &str = "unknown";

// ============ DTOs ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAnalytics {
    pub share_link_id: String,
    pub window_days: u32,
    pub total_accesses: u64,
    pub unique_visitors: u64,
    pub average_session_duration_seconds: f64,
    pub bot_accesses: u64,
    pub top_countries: Vec<BreakdownEntry>,
    pub top_devices: Vec<BreakdownEntry>,
    pub top_browsers: Vec<BreakdownEntry>,
    pub top_operating_systems: Vec<BreakdownEntry>,
    pub top_referrers: Vec<BreakdownEntry>,
    /// 每天一项，按日期升序，包含 0 访问的日期
    pub daily_trend: Vec<DailyCount>,
}

// ============ Pure aggregation ============

/// 窗口起点：today 往前 (days - 1) 天的 UTC 零点；超出日期范围返回 `None`
pub fn window_start(today: NaiveDate, window_days: u32) -> Option<NaiveDate> {
    let back = Duration::try_days(i64::from(window_days.max(1)) - 1)?;
    today.checked_sub_signed(back)
}

fn top_n<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<BreakdownEntry> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut entries: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(value, count)| BreakdownEntry {
            value: value.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(n);
    entries
}

/// 聚合窗口内的访问日志；窗口外的记录被忽略
pub fn aggregate_access_logs(
    share_link_id: &str,
    logs: &[AccessLogRecord],
    today: NaiveDate,
    window_days: u32,
    top: usize,
) -> AccessAnalytics {
    let window_days = window_days.clamp(1, MAX_WINDOW_DAYS);
    let start = window_start(today, window_days).unwrap_or(NaiveDate::MIN);

    let in_window: Vec<&AccessLogRecord> = logs
        .iter()
        .filter(|log| {
            let day = log.accessed_at.date_naive();
            day >= start && day <= today
        })
        .collect();

    let mut buckets: Vec<DailyCount> = (0..window_days)
        .map(|offset| DailyCount {
            date: start + Duration::days(i64::from(offset)),
            count: 0,
        })
        .collect();
    for log in &in_window {
        let index = (log.accessed_at.date_naive() - start).num_days() as usize;
        buckets[index].count += 1;
    }

    let unique_visitors = in_window
        .iter()
        .map(|log| log.ip_address.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;

    let durations: Vec<u64> = in_window
        .iter()
        .map(|log| u64::from(log.session_duration_seconds))
        .filter(|&d| d > 0)
        .collect();
    let average_session_duration_seconds = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<u64>() as f64 / durations.len() as f64
    };

    AccessAnalytics {
        share_link_id: share_link_id.to_string(),
        window_days,
        total_accesses: in_window.len() as u64,
        unique_visitors,
        average_session_duration_seconds,
        bot_accesses: in_window.iter().filter(|log| log.is_bot).count() as u64,
        top_countries: top_n(
            in_window
                .iter()
                .map(|log| log.country_code.as_deref().unwrap_or(UNKNOWN)),
            top,
        ),
        top_devices: top_n(in_window.iter().map(|log| log.device_type.as_ref()), top),
        top_browsers: top_n(
            in_window
                .iter()
                .map(|log| log.browser_name.as_deref().unwrap_or(UNKNOWN)),
            top,
        ),
        top_operating_systems: top_n(
            in_window
                .iter()
                .map(|log| log.operating_system.as_deref().unwrap_or(UNKNOWN)),
            top,
        ),
        top_referrers: top_n(
            in_window
                .iter()
                .map(|log| log.referrer.as_deref().unwrap_or(UNKNOWN)),
            top,
        ),
        daily_trend: buckets,
    }
}

// ============ Service ============

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
    top_n: usize,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>, top_n: usize) -> Self {
        Self { storage, top_n }
    }

    pub async fn get_access_analytics(
        &self,
        share_link_id: &str,
        window_days: u32,
    ) -> Result<AccessAnalytics> {
        self.get_access_analytics_at(share_link_id, window_days, Utc::now())
            .await
    }

    pub async fn get_access_analytics_at(
        &self,
        share_link_id: &str,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<AccessAnalytics> {
        if window_days == 0 {
            return Err(ShareLinkError::validation("windowDays must be at least 1"));
        }
        if window_days > MAX_WINDOW_DAYS {
            return Err(ShareLinkError::validation(format!(
                "windowDays must not exceed {}",
                MAX_WINDOW_DAYS
            )));
        }

        let today = now.date_naive();
        let since = window_start(today, window_days)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| ShareLinkError::validation("Invalid analytics window"))?;

        let logs = self
            .storage
            .list_access_logs_since(share_link_id, since)
            .await?;
        debug!(
            "Aggregating {} access logs for share link {} over {} days",
            logs.len(),
            share_link_id,
            window_days
        );

        Ok(aggregate_access_logs(
            share_link_id,
            &logs,
            today,
            window_days,
            self.top_n,
        ))
    }

    /// 删除 retention_days 之前的访问日志，可重复执行
    pub async fn cleanup_old_access_logs(&self, retention_days: u32) -> Result<u64> {
        let cutoff = Duration::try_days(i64::from(retention_days))
            .and_then(|keep| Utc::now().checked_sub_signed(keep))
            .ok_or_else(|| {
                ShareLinkError::validation(format!("Invalid retention period: {} days", retention_days))
            })?;
        let deleted = self
            .storage
            .delete_access_logs_before(cutoff, PURGE_BATCH_SIZE)
            .await?;

        if deleted > 0 {
            info!(
                "Purged {} access logs older than {} days",
                deleted, retention_days
            );
        }
        Ok(deleted)
    }

    /// 只在时长仍为 0 时写入一次
    pub async fn update_session_duration(&self, log_id: i64, seconds: u32) -> Result<bool> {
        self.storage.update_session_duration(log_id, seconds).await
    }
}
