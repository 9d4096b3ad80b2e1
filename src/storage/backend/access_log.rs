//! Access log persistence

use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use tracing::{debug, warn};

use super::converters::{access_log_model_to_record, new_access_log_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShareLinkError};
use crate::storage::models::{AccessLogRecord, NewAccessLog};

use migration::entities::share_link_access_log;

/// 单次清理的最大批次数
const MAX_PURGE_ITERATIONS: u32 = 1000;

impl SeaOrmStorage {
    /// 写入一条访问日志，返回自增 id
    pub async fn insert_access_log(&self, log: &NewAccessLog) -> Result<i64> {
        let db = &self.db;
        let result = retry::with_retry("insert_access_log", self.retry_config, || async {
            share_link_access_log::Entity::insert(new_access_log_to_active_model(log))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("写入访问日志失败: {}", e)))?;

        Ok(result.last_insert_id)
    }

    /// 某个链接在 since 之后的全部访问日志
    pub async fn list_access_logs_since(
        &self,
        share_link_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AccessLogRecord>> {
        let db = &self.db;
        let models = retry::with_retry("list_access_logs_since", self.retry_config, || async {
            share_link_access_log::Entity::find()
                .filter(share_link_access_log::Column::ShareLinkId.eq(share_link_id))
                .filter(share_link_access_log::Column::AccessedAt.gte(since))
                .order_by_asc(share_link_access_log::Column::AccessedAt)
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询访问日志失败: {}", e)))?;

        models.into_iter().map(access_log_model_to_record).collect()
    }

    /// 仅在时长仍为 0 时写入，返回是否写入成功
    pub async fn update_session_duration(&self, log_id: i64, seconds: u32) -> Result<bool> {
        let db = &self.db;
        let seconds = i32::try_from(seconds).unwrap_or(i32::MAX);
        let rows = retry::with_retry("update_session_duration", self.retry_config, || async {
            share_link_access_log::Entity::update_many()
                .col_expr(
                    share_link_access_log::Column::SessionDurationSeconds,
                    Expr::value(seconds),
                )
                .filter(share_link_access_log::Column::Id.eq(log_id))
                .filter(share_link_access_log::Column::SessionDurationSeconds.eq(0))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("更新会话时长失败: {}", e)))?
        .rows_affected;

        Ok(rows > 0)
    }

    /// 分批删除 cutoff 之前的访问日志，返回删除总数
    pub async fn delete_access_logs_before(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: u64,
    ) -> Result<u64> {
        let db = &self.db;
        let batch_size = batch_size.max(1);
        let mut total_deleted = 0u64;
        let mut iterations = 0u32;

        loop {
            if iterations >= MAX_PURGE_ITERATIONS {
                warn!(
                    "Access log purge reached max iterations {} (deleted {} rows)",
                    MAX_PURGE_ITERATIONS, total_deleted
                );
                break;
            }

            let ids: Vec<i64> = retry::with_retry("purge_access_logs(select)", self.retry_config, || async {
                share_link_access_log::Entity::find()
                    .select_only()
                    .column(share_link_access_log::Column::Id)
                    .filter(share_link_access_log::Column::AccessedAt.lt(cutoff))
                    .order_by_asc(share_link_access_log::Column::Id)
                    .limit(batch_size)
                    .into_tuple::<i64>()
                    .all(db)
                    .await
            })
            .await
            .map_err(|e| ShareLinkError::database_operation(format!("查询过期访问日志失败: {}", e)))?;

            if ids.is_empty() {
                break;
            }

            let deleted = retry::with_retry("purge_access_logs(delete)", self.retry_config, || async {
                share_link_access_log::Entity::delete_many()
                    .filter(share_link_access_log::Column::Id.is_in(ids.clone()))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShareLinkError::database_operation(format!("删除过期访问日志失败: {}", e)))?
            .rows_affected;

            total_deleted += deleted;
            iterations += 1;
            debug!(
                "Access log purge batch {}: deleted {} rows (total {})",
                iterations, deleted, total_deleted
            );

            if (ids.len() as u64) < batch_size {
                break;
            }

            tokio::time::sleep(StdDuration::from_millis(50)).await;
        }

        Ok(total_deleted)
    }
}
