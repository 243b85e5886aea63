mod moka;
mod null;
mod redis;

use std::sync::Arc;

use tracing::info;

pub use self::moka::MokaUrlCache;
pub use self::null::NullUrlCache;
pub use self::redis::RedisUrlCache;

use crate::cache::UrlCache;
use crate::cache::redis_conn::RedisHandle;
use crate::config::{CacheBackend, CacheConfig};
use crate::errors::Result;

pub struct CacheFactory;

impl CacheFactory {
    /// Build the URL cache selected by `cache.type`.
    ///
    /// The Redis backend reuses `shared` when given (already connected to
    /// `cache.redis.url`); otherwise it connects and pings here so a wrong URL
    /// fails startup instead of degrading every request.
    pub async fn create(
        config: &CacheConfig,
        shared: Option<RedisHandle>,
    ) -> Result<Arc<dyn UrlCache>> {
        let cache: Arc<dyn UrlCache> = match config.cache_type {
            CacheBackend::Redis => {
                let handle = match shared {
                    Some(handle) => handle,
                    None => RedisHandle::connect(&config.redis.url).await?,
                };
                Arc::new(RedisUrlCache::new(handle, config.redis.key_prefix.clone()))
            }
            CacheBackend::Memory => Arc::new(MokaUrlCache::new(config.memory.max_capacity)),
            CacheBackend::None => Arc::new(NullUrlCache),
        };

        info!(
            "Using URL cache backend: {} (ttl {}s)",
            cache.name(),
            config.default_ttl
        );
        Ok(cache)
    }
}
