use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// Short key → original URL cache.
///
/// Implementations return their failures instead of logging and hiding
/// them; the service decides whether a failure degrades or aborts.
#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` is a plain miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Last write wins; the entry expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Shared bit array behind the membership filter.
///
/// Bits are only ever set, never cleared, so concurrent writers from any
/// number of service instances need no coordination.
#[async_trait]
pub trait BitStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// 设置所有给定位置的 bit 为 1
    async fn set_bits(&self, positions: &[u64]) -> Result<()>;

    async fn get_bit(&self, position: u64) -> Result<bool>;
}
