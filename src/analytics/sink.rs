use std::sync::Arc;

use async_trait::async_trait;

use crate::storage::{NewAccessLog, SeaOrmStorage};

/// 访问日志落地
#[async_trait]
pub trait AccessLogSink: Send + Sync {
    /// 写入一条日志，返回日志 id
    async fn write_access_log(&self, log: NewAccessLog) -> anyhow::Result<i64>;
}

/// 写入数据库
pub struct StorageAccessSink {
    storage: Arc<SeaOrmStorage>,
}

impl StorageAccessSink {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AccessLogSink for StorageAccessSink {
    async fn write_access_log(&self, log: NewAccessLog) -> anyhow::Result<i64> {
        Ok(self.storage.insert_access_log(&log).await?)
    }
}
