use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, error, trace, warn};

use crate::cache::{CacheResult, LinkCache};
use crate::errors::{Result, ShareLinkError};
use crate::storage::ShareLink;

/// Redis 缓存
///
/// `ConnectionManager` 负责断线重连；任何 Redis 错误都退化为 `Miss`。
pub struct RedisLinkCache {
    conn: ConnectionManager,
    key_prefix: String,
    default_ttl: Duration,
}

impl RedisLinkCache {
    pub async fn connect(url: &str, key_prefix: &str, default_ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| ShareLinkError::cache_connection(format!("Invalid Redis URL {}: {}", url, e)))?;

        let mut conn = ConnectionManager::new(client).await.map_err(|e| {
            ShareLinkError::cache_connection(format!("Failed to connect to Redis at {}: {}", url, e))
        })?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!(
            "Redis link cache connected (ping: {}), prefix: '{}', TTL: {}s",
            pong,
            key_prefix,
            default_ttl.as_secs()
        );

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
            default_ttl,
        })
    }

    fn make_key(&self, token: &str) -> String {
        format!("{}{}", self.key_prefix, token)
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get(&self, token: &str) -> CacheResult {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(self.make_key(token)).await;

        match result {
            Ok(Some(data)) => match serde_json::from_str::<ShareLink>(&data) {
                Ok(link) => {
                    trace!("Redis cache hit: {}", token);
                    CacheResult::Found(link)
                }
                Err(e) => {
                    error!("Failed to deserialize cached share link: {}", e);
                    CacheResult::Miss
                }
            },
            Ok(None) => CacheResult::Miss,
            Err(e) => {
                warn!("Redis get failed, falling back to storage: {}", e);
                CacheResult::Miss
            }
        }
    }

    async fn insert(&self, token: &str, link: ShareLink) {
        let ttl = link.cache_ttl(self.default_ttl, chrono::Utc::now()).as_secs().max(1);
        let payload = match serde_json::to_string(&link) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to serialize share link for cache: {}", e);
                return;
            }
        };

        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<String, String, ()>(self.make_key(token), payload, ttl)
            .await
        {
            warn!("Redis set failed: {}", e);
        }
    }

    async fn remove(&self, token: &str) {
        let mut conn = self.conn.clone();
        match conn.del::<String, i32>(self.make_key(token)).await {
            Ok(n) => trace!("Redis removed {} key(s) for {}", n, token),
            Err(e) => error!("Redis del failed for cached share link: {}", e),
        }
    }

    async fn invalidate_all(&self) {
        warn!("RedisLinkCache does not support invalidate_all; entries expire by TTL");
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
