use async_trait::async_trait;

use crate::storage::ShareLink;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 命中缓存
    Found(ShareLink),
    /// 未命中（或缓存不可用），需要回源
    Miss,
}

/// token → 链接快照 的缓存
///
/// 实现必须自行处理内部同步；后端故障时返回 `Miss`，不得向调用方抛错。
#[async_trait]
pub trait LinkCache: Send + Sync {
    async fn get(&self, token: &str) -> CacheResult;

    /// TTL 由实现根据默认值和链接的 `expires_at` 决定
    async fn insert(&self, token: &str, link: ShareLink);

    async fn remove(&self, token: &str);

    async fn invalidate_all(&self);

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}
