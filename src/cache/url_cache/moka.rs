use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::cache::UrlCache;
use crate::errors::Result;

#[derive(Clone)]
struct Entry {
    url: String,
    ttl: Duration,
}

/// 按条目记录的 TTL 计算过期时间
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process URL cache, for single-instance deployments and tests.
pub struct MokaUrlCache {
    inner: Cache<String, Entry>,
}

impl MokaUrlCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        debug!("MokaUrlCache initialized with max capacity: {}", max_capacity);
        Self { inner }
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).await.map(|entry| entry.url))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.inner
            .insert(
                key.to_string(),
                Entry {
                    url: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }
}
