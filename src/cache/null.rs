use async_trait::async_trait;
use tracing::trace;

use crate::cache::{CacheResult, LinkCache};
use crate::storage::ShareLink;

/// 不缓存任何内容，每次都回源
pub struct NullLinkCache;

#[async_trait]
impl LinkCache for NullLinkCache {
    async fn get(&self, token: &str) -> CacheResult {
        trace!("NullLinkCache.get called for token: {}", token);
        CacheResult::Miss
    }

    async fn insert(&self, _token: &str, _link: ShareLink) {}

    async fn remove(&self, _token: &str) {}

    async fn invalidate_all(&self) {}

    fn name(&self) -> &'static str {
        "none"
    }
}
