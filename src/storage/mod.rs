use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{InsertOutcome, SeaOrmStorage};
pub use models::{
    AccessLogRecord, AccessMode, DeviceType, NewAccessLog, ResourceKind, ShareLink, ShareLinkPatch,
    ShareLinkView, SharedResource,
};

pub struct StorageFactory;

impl StorageFactory {
    /// 从 URL 推断数据库类型并建立连接
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let storage = SeaOrmStorage::from_config(config).await?;
        Ok(Arc::new(storage))
    }
}
