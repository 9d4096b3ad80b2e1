//! Share link write operations
//!
//! Every conditional write is a single UPDATE/DELETE carrying its whole
//! predicate, so concurrent callers never act on a stale read.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, SqlErr, sea_query::Expr,
};
use tracing::{debug, info};

use super::converters::share_link_to_active_model;
use super::query::owner_condition;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShareLinkError};
use crate::storage::models::{ShareLink, ShareLinkPatch};

use migration::entities::{share_link, share_link_access_log};

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// token 撞上唯一索引，调用方应重新生成
    TokenConflict,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl SeaOrmStorage {
    pub async fn insert_link(&self, link: &ShareLink) -> Result<InsertOutcome> {
        let db = &self.db;
        let result = retry::with_retry("insert_link", self.retry_config, || async {
            share_link::Entity::insert(share_link_to_active_model(link))
                .exec_without_returning(db)
                .await
        })
        .await;

        match result {
            Ok(_) => {
                debug!("Share link inserted: {}", link.id);
                Ok(InsertOutcome::Inserted)
            }
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::TokenConflict),
            Err(e) => Err(ShareLinkError::database_operation(format!(
                "插入分享链接失败: {}",
                e
            ))),
        }
    }

    /// 复用已有链接时按 id 更新设置，仅命中仍为 active 的行
    pub async fn apply_patch_if_active(
        &self,
        id: &str,
        patch: &ShareLinkPatch,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let db = &self.db;
        let rows = retry::with_retry("apply_patch_if_active", self.retry_config, || async {
            patch_update(patch, now)
                .filter(share_link::Column::Id.eq(id))
                .filter(share_link::Column::IsActive.eq(true))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("更新分享链接失败: {}", e)))?
        .rows_affected;

        Ok(rows > 0)
    }

    /// 在所有权谓词下更新，未命中返回 `None`
    pub async fn update_owned(
        &self,
        token: &str,
        workspace_id: &str,
        user_id: &str,
        patch: &ShareLinkPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<ShareLink>> {
        let db = &self.db;
        let condition = owner_condition(token, workspace_id, user_id);
        let rows = retry::with_retry("update_owned", self.retry_config, || async {
            patch_update(patch, now)
                .filter(condition.clone())
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("更新分享链接失败: {}", e)))?
        .rows_affected;

        if rows == 0 {
            return Ok(None);
        }
        self.find_by_owner_token(token, workspace_id, user_id).await
    }

    /// 在所有权谓词下删除链接及其访问日志
    pub async fn delete_owned(&self, token: &str, workspace_id: &str, user_id: &str) -> Result<bool> {
        let Some(link) = self.find_by_owner_token(token, workspace_id, user_id).await? else {
            return Ok(false);
        };

        let db = &self.db;
        let condition = owner_condition(token, workspace_id, user_id);
        let rows = retry::with_retry("delete_owned", self.retry_config, || async {
            share_link::Entity::delete_many()
                .filter(condition.clone())
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("删除分享链接失败: {}", e)))?
        .rows_affected;

        if rows == 0 {
            return Ok(false);
        }

        let logs = self.delete_access_logs_for_link(&link.id).await?;
        info!(
            "Share link {} deleted together with {} access logs",
            link.id, logs
        );
        Ok(true)
    }

    /// access_count + 1，last_accessed_at = now；不做任何校验
    pub async fn record_access(&self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        let db = &self.db;
        let rows = retry::with_retry("record_access", self.retry_config, || async {
            share_link::Entity::update_many()
                .col_expr(
                    share_link::Column::AccessCount,
                    Expr::col(share_link::Column::AccessCount).add(1i64),
                )
                .col_expr(share_link::Column::LastAccessedAt, Expr::value(now))
                .filter(share_link::Column::Token.eq(token))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("记录访问失败: {}", e)))?
        .rows_affected;

        Ok(rows > 0)
    }

    /// 仅当链接仍处于激活状态时停用，返回是否实际发生了变更
    pub async fn deactivate_if_active(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let db = &self.db;
        let rows = retry::with_retry("deactivate_if_active", self.retry_config, || async {
            share_link::Entity::update_many()
                .col_expr(share_link::Column::IsActive, Expr::value(false))
                .col_expr(share_link::Column::UpdatedAt, Expr::value(now))
                .filter(share_link::Column::Id.eq(id))
                .filter(share_link::Column::IsActive.eq(true))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("停用分享链接失败: {}", e)))?
        .rows_affected;

        Ok(rows > 0)
    }

    pub(super) async fn delete_access_logs_for_link(&self, share_link_id: &str) -> Result<u64> {
        let db = &self.db;
        let rows = retry::with_retry("delete_access_logs_for_link", self.retry_config, || async {
            share_link_access_log::Entity::delete_many()
                .filter(share_link_access_log::Column::ShareLinkId.eq(share_link_id))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("删除访问日志失败: {}", e)))?
        .rows_affected;

        Ok(rows)
    }
}

/// updated_at 总是写入，保证 UPDATE 至少有一列
fn patch_update(patch: &ShareLinkPatch, now: DateTime<Utc>) -> sea_orm::UpdateMany<share_link::Entity> {
    let mut update = share_link::Entity::update_many()
        .col_expr(share_link::Column::UpdatedAt, Expr::value(now));

    if let Some(mode) = patch.access_mode {
        update = update.col_expr(
            share_link::Column::AccessMode,
            Expr::value(mode.as_ref().to_string()),
        );
    }
    if let Some(active) = patch.is_active {
        update = update.col_expr(share_link::Column::IsActive, Expr::value(active));
    }
    if let Some(expires_at) = patch.expires_at {
        update = update.col_expr(share_link::Column::ExpiresAt, Expr::value(expires_at));
    }
    if let Some(days) = patch.inactivity_expiration_days {
        update = update.col_expr(
            share_link::Column::InactivityExpirationDays,
            Expr::value(days.map(|d| d as i32)),
        );
    }
    update
}
