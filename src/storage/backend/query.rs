//! Read-only share link queries

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::trace;

use super::converters::model_to_share_link;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShareLinkError};
use crate::storage::models::{ShareLink, SharedResource};

use migration::entities::share_link;

/// (token, workspace, creator) 所有权谓词
pub(super) fn owner_condition(token: &str, workspace_id: &str, user_id: &str) -> Condition {
    Condition::all()
        .add(share_link::Column::Token.eq(token))
        .add(share_link::Column::WorkspaceId.eq(workspace_id))
        .add(share_link::Column::CreatedById.eq(user_id))
}

fn collect_links(models: Vec<share_link::Model>) -> Result<Vec<ShareLink>> {
    models.into_iter().map(model_to_share_link).collect()
}

impl SeaOrmStorage {
    pub async fn find_by_token(&self, token: &str) -> Result<Option<ShareLink>> {
        let db = &self.db;
        let model = retry::with_retry("find_by_token", self.retry_config, || async {
            share_link::Entity::find()
                .filter(share_link::Column::Token.eq(token))
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询分享链接失败: {}", e)))?;

        model.map(model_to_share_link).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ShareLink>> {
        let db = &self.db;
        let model = retry::with_retry("find_by_id", self.retry_config, || async {
            share_link::Entity::find_by_id(id.to_string()).one(db).await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询分享链接失败: {}", e)))?;

        model.map(model_to_share_link).transpose()
    }

    /// token 唯一性预检查，最终以唯一索引为准
    pub async fn token_exists(&self, token: &str) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry("token_exists", self.retry_config, || async {
            share_link::Entity::find()
                .filter(share_link::Column::Token.eq(token))
                .count(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("检查 token 失败: {}", e)))?;

        Ok(count > 0)
    }

    /// 同一 (workspace, resource, creator) 下的全部链接，最新的在前
    pub async fn find_by_owner_resource(
        &self,
        workspace_id: &str,
        resource: &SharedResource,
        user_id: &str,
    ) -> Result<Vec<ShareLink>> {
        let db = &self.db;
        let condition = Condition::all()
            .add(share_link::Column::WorkspaceId.eq(workspace_id))
            .add(share_link::Column::ResourceType.eq(resource.kind().as_ref()))
            .add(share_link::Column::ResourceId.eq(resource.id()))
            .add(share_link::Column::CreatedById.eq(user_id));

        let models = retry::with_retry("find_by_owner_resource", self.retry_config, || async {
            share_link::Entity::find()
                .filter(condition.clone())
                .order_by_desc(share_link::Column::CreatedAt)
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询分享链接失败: {}", e)))?;

        collect_links(models)
    }

    pub async fn find_by_owner_token(
        &self,
        token: &str,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<ShareLink>> {
        let db = &self.db;
        let condition = owner_condition(token, workspace_id, user_id);
        let model = retry::with_retry("find_by_owner_token", self.retry_config, || async {
            share_link::Entity::find()
                .filter(condition.clone())
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询分享链接失败: {}", e)))?;

        model.map(model_to_share_link).transpose()
    }

    /// 用户在某个 workspace 下创建的全部链接
    pub async fn list_by_user(&self, workspace_id: &str, user_id: &str) -> Result<Vec<ShareLink>> {
        let db = &self.db;
        let models = retry::with_retry("list_by_user", self.retry_config, || async {
            share_link::Entity::find()
                .filter(share_link::Column::WorkspaceId.eq(workspace_id))
                .filter(share_link::Column::CreatedById.eq(user_id))
                .order_by_desc(share_link::Column::CreatedAt)
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询用户分享链接失败: {}", e)))?;

        collect_links(models)
    }

    /// 仍为激活状态但 expires_at 已过的链接
    pub async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<ShareLink>> {
        let db = &self.db;
        let models = retry::with_retry("find_expired_active", self.retry_config, || async {
            share_link::Entity::find()
                .filter(share_link::Column::IsActive.eq(true))
                .filter(share_link::Column::ExpiresAt.is_not_null())
                .filter(share_link::Column::ExpiresAt.lt(now))
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询过期链接失败: {}", e)))?;

        trace!("Found {} expired active share links", models.len());
        collect_links(models)
    }

    /// 指定阈值下，最后访问（或创建）时间不晚于 cutoff 的激活链接
    pub async fn find_inactive_for_threshold(
        &self,
        days: u32,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ShareLink>> {
        let db = &self.db;
        let stale = Condition::any()
            .add(share_link::Column::LastAccessedAt.lte(cutoff))
            .add(
                Condition::all()
                    .add(share_link::Column::LastAccessedAt.is_null())
                    .add(share_link::Column::CreatedAt.lte(cutoff)),
            );

        let models = retry::with_retry("find_inactive_for_threshold", self.retry_config, || async {
            share_link::Entity::find()
                .filter(share_link::Column::IsActive.eq(true))
                .filter(share_link::Column::InactivityExpirationDays.eq(days as i32))
                .filter(stale.clone())
                .all(db)
                .await
        })
        .await
        .map_err(|e| ShareLinkError::database_operation(format!("查询不活跃链接失败: {}", e)))?;

        trace!(
            "Found {} inactive share links for threshold {}d",
            models.len(),
            days
        );
        collect_links(models)
    }
}
