//! 分享链接访问日志表
//!
//! 每次成功的内容访问写入一行，除 session_duration_seconds 外只追加不修改。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShareLinkAccessLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::ShareLinkId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::IpAddress)
                            .string_len(45)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::DeviceType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::BrowserName)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::OperatingSystem)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::IsBot)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::CountryCode)
                            .string_len(2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::City)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(ShareLinkAccessLogs::Referrer).text().null())
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::AccessMethod)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::AuthenticatedUserId)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::SessionDurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ShareLinkAccessLogs::AccessedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间窗口查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_link_access_logs_link_time")
                    .table(ShareLinkAccessLogs::Table)
                    .col(ShareLinkAccessLogs::ShareLinkId)
                    .col(ShareLinkAccessLogs::AccessedAt)
                    .to_owned(),
            )
            .await?;

        // 保留期清理
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_share_link_access_logs_accessed_at")
                    .table(ShareLinkAccessLogs::Table)
                    .col(ShareLinkAccessLogs::AccessedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_share_link_access_logs_accessed_at")
                    .table(ShareLinkAccessLogs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_share_link_access_logs_link_time")
                    .table(ShareLinkAccessLogs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ShareLinkAccessLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShareLinkAccessLogs {
    #[sea_orm(iden = "share_link_access_logs")]
    Table,
    Id,
    ShareLinkId,
    IpAddress,
    DeviceType,
    BrowserName,
    OperatingSystem,
    IsBot,
    CountryCode,
    City,
    Referrer,
    AccessMethod,
    AuthenticatedUserId,
    SessionDurationSeconds,
    AccessedAt,
}
