use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::BitStore;
use crate::errors::Result;

/// Process-local bit array.
///
/// Words are allocated on first write, so a filter sized for billions of
/// items only costs memory for the bits actually set.
#[derive(Default)]
pub struct MemoryBitStore {
    words: DashMap<u64, u64>,
}

impl MemoryBitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits currently set.
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| w.value().count_ones() as u64).sum()
    }
}

#[inline]
fn locate(position: u64) -> (u64, u64) {
    (position / 64, 1u64 << (position % 64))
}

#[async_trait]
impl BitStore for MemoryBitStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set_bits(&self, positions: &[u64]) -> Result<()> {
        for &position in positions {
            let (word, mask) = locate(position);
            *self.words.entry(word).or_insert(0) |= mask;
        }
        Ok(())
    }

    async fn get_bit(&self, position: u64) -> Result<bool> {
        let (word, mask) = locate(position);
        Ok(self.words.get(&word).is_some_and(|w| *w & mask != 0))
    }
}
