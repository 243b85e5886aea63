use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, trace};

use crate::cache::UrlCache;
use crate::cache::redis_conn::RedisHandle;
use crate::errors::Result;

/// URL cache stored as plain Redis strings with `SET .. EX`.
pub struct RedisUrlCache {
    handle: RedisHandle,
    key_prefix: String,
}

impl RedisUrlCache {
    pub fn new(handle: RedisHandle, key_prefix: impl Into<String>) -> Self {
        let key_prefix = key_prefix.into();
        debug!("RedisUrlCache created with prefix: '{}'", key_prefix);
        Self { handle, key_prefix }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.make_key(key);
        let value: Option<String> = self
            .handle
            .run(|mut conn| async move { conn.get::<_, Option<String>>(redis_key).await })
            .await?;

        trace!(
            "Redis cache {} for key: {}",
            if value.is_some() { "hit" } else { "miss" },
            key
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let redis_key = self.make_key(key);
        let value = value.to_string();
        // Redis 的 EX 最小为 1 秒
        let ttl_secs = ttl.as_secs().max(1);

        self.handle
            .run(|mut conn| async move {
                conn.set_ex::<_, _, ()>(redis_key, value, ttl_secs).await
            })
            .await?;

        trace!("Inserted key into Redis cache: {} (ttl {}s)", key, ttl_secs);
        Ok(())
    }
}
