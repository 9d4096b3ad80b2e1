//! Access log entity, one row per tracked content fetch

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "share_link_access_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub share_link_id: String,
    pub ip_address: String,
    /// desktop | mobile | tablet
    pub device_type: String,
    pub browser_name: Option<String>,
    pub operating_system: Option<String>,
    pub is_bot: bool,
    pub country_code: Option<String>,
    pub city: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub referrer: Option<String>,
    /// Access mode of the link at the time of the fetch
    pub access_method: String,
    pub authenticated_user_id: Option<String>,
    pub session_duration_seconds: i32,
    pub accessed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
