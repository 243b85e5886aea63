//! Membership filter over short keys
//!
//! A Bloom filter whose bit array lives in a [`BitStore`], so every service
//! instance sharing the store observes the others' insertions. `exists`
//! answers `false` only for keys that were definitely never added.

mod memory;
mod redis;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, trace};
use xxhash_rust::xxh3::xxh3_128;

pub use self::memory::MemoryBitStore;
pub use self::redis::{REDIS_MAX_BITS, RedisBitStore};

use crate::cache::BitStore;
use crate::cache::redis_conn::RedisHandle;
use crate::config::{FilterBackend, FilterConfig};
use crate::errors::{Result, ShortenerError};

/// Bit-array size `m` and hash count `k`, fixed for the filter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    pub size: u64,
    pub hash_count: u32,
}

impl FilterParams {
    /// Optimal parameters for `expected_items` (n) at false-positive rate `fp_rate` (p).
    ///
    /// `m = ceil(-n ln p / (ln 2)^2)`, `k = floor(m / n * ln 2)`, with `k >= 1`.
    pub fn optimal(expected_items: u64, fp_rate: f64) -> Result<Self> {
        if expected_items == 0 {
            return Err(ShortenerError::filter_config(
                "expected item count must be positive",
            ));
        }
        if !(fp_rate > 0.0 && fp_rate < 1.0) {
            return Err(ShortenerError::filter_config(format!(
                "false positive rate must be in (0, 1), got {}",
                fp_rate
            )));
        }

        let n = expected_items as f64;
        let ln2 = std::f64::consts::LN_2;
        let size = (-n * fp_rate.ln() / (ln2 * ln2)).ceil();
        if !size.is_finite() || size >= u64::MAX as f64 {
            return Err(ShortenerError::filter_config(format!(
                "bit array for {} items at p={} is too large",
                expected_items, fp_rate
            )));
        }
        let size = (size as u64).max(1);
        let hash_count = ((size as f64 / n) * ln2).floor().max(1.0) as u32;

        Ok(Self { size, hash_count })
    }
}

/// Bit positions for `item`: `(h1 + i * h2) mod m` for `i` in `0..k`.
///
/// `h1` is SHA-256 and `h2` is XXH3-128 of the UTF-8 bytes, both read as
/// big unsigned integers. Reducing them mod `m` first gives the same
/// positions as the full-width arithmetic.
pub fn bit_positions(item: &str, params: FilterParams) -> impl Iterator<Item = u64> {
    let m = params.size as u128;
    let h1 = reduce_be(&Sha256::digest(item.as_bytes()), m);
    let h2 = xxh3_128(item.as_bytes()) % m;

    (0..params.hash_count as u128).map(move |i| ((h1 + i * h2) % m) as u64)
}

/// Big-endian bytes as an integer, reduced mod `m`.
fn reduce_be(bytes: &[u8], m: u128) -> u128 {
    bytes
        .iter()
        .fold(0u128, |acc, &b| ((acc << 8) | b as u128) % m)
}

pub struct MembershipFilter {
    params: FilterParams,
    bits: Arc<dyn BitStore>,
}

impl MembershipFilter {
    pub fn new(params: FilterParams, bits: Arc<dyn BitStore>) -> Self {
        debug!(
            "Membership filter on {} bit store: m={} bits, k={}",
            bits.name(),
            params.size,
            params.hash_count
        );
        Self { params, bits }
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub async fn add(&self, item: &str) -> Result<()> {
        let positions: Vec<u64> = bit_positions(item, self.params).collect();
        self.bits.set_bits(&positions).await?;
        trace!("Added '{}' to membership filter", item);
        Ok(())
    }

    /// `false` means definitely absent; `true` means possibly present.
    pub async fn exists(&self, item: &str) -> Result<bool> {
        for position in bit_positions(item, self.params) {
            if !self.bits.get_bit(position).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Build the filter described by `config`, or `None` when disabled.
    ///
    /// The Redis backend connects to `filter.redis_url` when set and otherwise
    /// uses `shared`, the handle the URL cache talks through.
    pub async fn from_config(
        config: &FilterConfig,
        shared: Option<&RedisHandle>,
    ) -> Result<Option<Arc<Self>>> {
        if !config.enabled {
            info!("Membership filter disabled");
            return Ok(None);
        }

        let params = FilterParams::optimal(config.expected_items, config.false_positive_rate)?;
        let bits: Arc<dyn BitStore> = match config.backend {
            FilterBackend::Redis => {
                let handle = match (&config.redis_url, shared) {
                    (Some(url), _) => RedisHandle::connect(url).await?,
                    (None, Some(handle)) => handle.clone(),
                    (None, None) => {
                        return Err(ShortenerError::filter_config(
                            "filter.backend = \"redis\" needs filter.redis_url or a shared Redis handle",
                        ));
                    }
                };
                Arc::new(RedisBitStore::new(handle, config.redis_key.clone(), params.size)?)
            }
            FilterBackend::Memory => Arc::new(MemoryBitStore::new()),
        };

        info!(
            "Membership filter ready: backend={}, n={}, p={}, m={}, k={}",
            bits.name(),
            config.expected_items,
            config.false_positive_rate,
            params.size,
            params.hash_count
        );
        Ok(Some(Arc::new(Self::new(params, bits))))
    }
}
