use async_trait::async_trait;
use tracing::debug;

use crate::cache::BitStore;
use crate::cache::redis_conn::RedisHandle;
use crate::errors::{Result, ShortenerError};

/// Redis strings are capped at 512 MB, i.e. 2^32 addressable bits.
pub const REDIS_MAX_BITS: u64 = 1 << 32;

/// Bit array kept in a single Redis string key shared by all instances.
pub struct RedisBitStore {
    handle: RedisHandle,
    key: String,
    size: u64,
}

impl RedisBitStore {
    /// `size` is the filter's bit count; it must fit in one Redis string.
    pub fn new(handle: RedisHandle, key: impl Into<String>, size: u64) -> Result<Self> {
        if size > REDIS_MAX_BITS {
            return Err(ShortenerError::filter_config(format!(
                "filter needs {} bits but a Redis string holds at most {}; \
                 lower filter.expected_items or raise filter.false_positive_rate",
                size, REDIS_MAX_BITS
            )));
        }

        let key = key.into();
        debug!("RedisBitStore using key '{}' ({} bits)", key, size);
        Ok(Self { handle, key, size })
    }

    fn check_position(&self, position: u64) -> Result<()> {
        if position >= self.size {
            return Err(ShortenerError::cache_operation(format!(
                "bit {} is outside filter key '{}' of {} bits",
                position, self.key, self.size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BitStore for RedisBitStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set_bits(&self, positions: &[u64]) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }
        for &position in positions {
            self.check_position(position)?;
        }

        // 一次 pipeline 写入全部 bit
        let mut pipe = redis::pipe();
        for &position in positions {
            pipe.setbit(&self.key, position as usize, true).ignore();
        }

        self.handle
            .run(|mut conn| async move { pipe.query_async::<()>(&mut conn).await })
            .await
    }

    async fn get_bit(&self, position: u64) -> Result<bool> {
        self.check_position(position)?;
        let key = self.key.clone();
        self.handle
            .run(|mut conn| async move {
                redis::cmd("GETBIT")
                    .arg(&key)
                    .arg(position)
                    .query_async::<bool>(&mut conn)
                    .await
            })
            .await
    }
}
