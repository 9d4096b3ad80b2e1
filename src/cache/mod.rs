pub mod moka;
pub mod null;
pub mod read_through;
pub mod redis;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::CacheConfig;

pub use self::moka::MokaLinkCache;
pub use self::null::NullLinkCache;
pub use self::redis::RedisLinkCache;
pub use read_through::ShareLinkLookup;
pub use traits::{CacheResult, LinkCache};

/// 按配置创建缓存；Redis 不可用时退化为不缓存
pub async fn create_cache(config: &CacheConfig) -> Arc<dyn LinkCache> {
    let default_ttl = Duration::from_secs(config.default_ttl.max(1));

    let cache: Arc<dyn LinkCache> = match config.cache_type.as_str() {
        "memory" => Arc::new(MokaLinkCache::new(config.memory.max_capacity, default_ttl)),
        "redis" => {
            match RedisLinkCache::connect(&config.redis.url, &config.redis.key_prefix, default_ttl)
                .await
            {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    warn!("{}; share links will be read from storage directly", e);
                    Arc::new(NullLinkCache)
                }
            }
        }
        "none" | "null" => Arc::new(NullLinkCache),
        other => {
            warn!("Unknown cache type '{}', falling back to memory", other);
            Arc::new(MokaLinkCache::new(config.memory.max_capacity, default_ttl))
        }
    };

    info!("Share link cache backend: {}", cache.name());
    cache
}
