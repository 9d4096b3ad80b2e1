//! Read-through, write-invalidate lookup of share links by token

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::trace;

use crate::cache::{CacheResult, LinkCache};
use crate::errors::Result;
use crate::storage::{SeaOrmStorage, ShareLink};

#[derive(Clone)]
pub struct ShareLinkLookup {
    cache: Arc<dyn LinkCache>,
    storage: Arc<SeaOrmStorage>,
    /// 每次失效递增；回填前比对，读库期间有写入则放弃回填
    epoch: Arc<RwLock<u64>>,
}

impl ShareLinkLookup {
    pub fn new(cache: Arc<dyn LinkCache>, storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            cache,
            storage,
            epoch: Arc::new(RwLock::new(0)),
        }
    }

    /// 先查缓存，未命中回源并回填；不存在的 token 不做负缓存
    ///
    /// 本进程内的失效不会被旧快照覆盖。多个进程共用 Redis 时，
    /// 其他进程的回填仍可能短暂写回旧值，最长不超过缓存 TTL。
    pub async fn get(&self, token: &str) -> Result<Option<ShareLink>> {
        if let CacheResult::Found(link) = self.cache.get(token).await {
            trace!("Share link cache hit");
            return Ok(Some(link));
        }

        let observed = self.epoch().await;
        let link = self.storage.find_by_token(token).await?;
        if let Some(ref link) = link {
            self.backfill(token, link.clone(), observed).await;
        }
        Ok(link)
    }

    pub async fn epoch(&self) -> u64 {
        *self.epoch.read().await
    }

    /// `observed` 之后发生过失效时不写入，返回是否写入
    pub async fn backfill(&self, token: &str, link: ShareLink, observed: u64) -> bool {
        let epoch = self.epoch.read().await;
        if *epoch != observed {
            trace!("Skipping stale share link backfill");
            return false;
        }
        self.cache.insert(token, link).await;
        true
    }

    /// 每条写路径都必须调用
    pub async fn invalidate(&self, token: &str) {
        let mut epoch = self.epoch.write().await;
        *epoch = epoch.wrapping_add(1);
        self.cache.remove(token).await;
    }

    pub fn cache(&self) -> &Arc<dyn LinkCache> {
        &self.cache
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }
}
