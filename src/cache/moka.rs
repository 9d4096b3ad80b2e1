use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::cache::{CacheResult, LinkCache};
use crate::storage::ShareLink;

/// 过期策略：默认 TTL，且不超过链接自身的 expires_at
struct ShareLinkExpiry {
    default_ttl: Duration,
}

impl Expiry<String, ShareLink> for ShareLinkExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ShareLink,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.cache_ttl(self.default_ttl, chrono::Utc::now()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &ShareLink,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.cache_ttl(self.default_ttl, chrono::Utc::now()))
    }
}

/// 进程内缓存
pub struct MokaLinkCache {
    inner: Cache<String, ShareLink>,
}

impl MokaLinkCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(ShareLinkExpiry { default_ttl })
            .build();

        debug!(
            "MokaLinkCache initialized with max capacity: {}, default TTL: {}s",
            max_capacity,
            default_ttl.as_secs()
        );
        Self { inner }
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get(&self, token: &str) -> CacheResult {
        match self.inner.get(token).await {
            Some(link) => CacheResult::Found(link),
            None => CacheResult::Miss,
        }
    }

    async fn insert(&self, token: &str, link: ShareLink) {
        self.inner.insert(token.to_string(), link).await;
    }

    async fn remove(&self, token: &str) {
        self.inner.invalidate(token).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
