use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "share_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub token: String,
    pub workspace_id: String,
    pub resource_type: String,
    pub resource_id: String,
    pub created_by_id: String,
    /// PUBLIC | LOGIN_REQUIRED
    pub access_mode: String,
    pub is_active: bool,
    pub expires_at: Option<DateTimeUtc>,
    pub inactivity_expiration_days: Option<i32>,
    pub access_count: i64,
    pub last_accessed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
