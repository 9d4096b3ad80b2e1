//! 分享链接表
//!
//! token 列上的唯一索引是 token 唯一性的最终保证，应用层的预检查只是快速路径。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShareLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShareLinks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShareLinks::Token).string_len(128).not_null())
                    .col(
                        ColumnDef::new(ShareLinks::WorkspaceId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::ResourceType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::ResourceId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::CreatedById)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::AccessMode)
                            .string_len(32)
                            .not_null()
                            .default("PUBLIC"),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::InactivityExpirationDays)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::AccessCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::LastAccessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_links_token")
                    .table(ShareLinks::Table)
                    .col(ShareLinks::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // create-or-reuse 查找：(workspace, resource, creator)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_links_owner_resource")
                    .table(ShareLinks::Table)
                    .col(ShareLinks::WorkspaceId)
                    .col(ShareLinks::ResourceType)
                    .col(ShareLinks::ResourceId)
                    .col(ShareLinks::CreatedById)
                    .to_owned(),
            )
            .await?;

        // 清理任务：绝对过期扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_links_active_expires")
                    .table(ShareLinks::Table)
                    .col(ShareLinks::IsActive)
                    .col(ShareLinks::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // 清理任务：按不活跃阈值逐个扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_links_active_inactivity")
                    .table(ShareLinks::Table)
                    .col(ShareLinks::IsActive)
                    .col(ShareLinks::InactivityExpirationDays)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_share_links_active_inactivity",
            "idx_share_links_active_expires",
            "idx_share_links_owner_resource",
            "idx_share_links_token",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(ShareLinks::Table).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(ShareLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShareLinks {
    #[sea_orm(iden = "share_links")]
    Table,
    Id,
    Token,
    WorkspaceId,
    ResourceType,
    ResourceId,
    CreatedById,
    AccessMode,
    IsActive,
    ExpiresAt,
    InactivityExpirationDays,
    AccessCount,
    LastAccessedAt,
    CreatedAt,
    UpdatedAt,
}
