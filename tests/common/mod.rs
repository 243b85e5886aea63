//! Shared test doubles and fixtures
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use shortener::cache::filter::MemoryBitStore;
use shortener::cache::{BitStore, UrlCache};
use shortener::errors::{Result, ShortenerError};
use shortener::storage::{SeaOrmStore, StoreOptions, StoreRole, UrlRecord, UrlStore};

// =============================================================================
// In-memory store with counters and failure switches
// =============================================================================

/// Rows can be shared between a "primary" and its "replicas" so each handle
/// keeps its own counters while seeing the same data.
pub struct MemoryStore {
    label: String,
    rows: Arc<Mutex<Vec<UrlRecord>>>,
    read_only: bool,
    pub reads: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_inserts: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl MemoryStore {
    pub fn primary() -> Arc<Self> {
        Arc::new(Self::build("primary", Arc::new(Mutex::new(Vec::new())), false))
    }

    /// A read-only handle over the same rows.
    pub fn replica_of(primary: &MemoryStore, label: &str) -> Arc<Self> {
        Arc::new(Self::build(label, Arc::clone(&primary.rows), true))
    }

    fn build(label: &str, rows: Arc<Mutex<Vec<UrlRecord>>>, read_only: bool) -> Self {
        Self {
            label: label.to_string(),
            rows,
            read_only,
            reads: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn row(&self, id: u64) -> Option<UrlRecord> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(ShortenerError::database_operation(format!(
                "store '{}' is a read-only replica",
                self.label
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    fn name(&self) -> &str {
        &self.label
    }

    async fn insert(&self, original_url: &str) -> Result<UrlRecord> {
        self.check_writable()?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(ShortenerError::database_connection("primary unreachable"));
        }

        let mut rows = self.rows.lock().unwrap();
        let record = UrlRecord {
            id: rows.len() as u64 + 1,
            original_url: original_url.to_string(),
            short_key: None,
            clicks: 0,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn update_short_key(&self, id: u64, short_key: &str) -> Result<()> {
        self.check_writable()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ShortenerError::database_operation("update failed"));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ShortenerError::consistency(format!("record {} vanished", id)))?;
        match &row.short_key {
            None => {
                row.short_key = Some(short_key.to_string());
                Ok(())
            }
            Some(existing) if existing == short_key => Ok(()),
            Some(existing) => Err(ShortenerError::consistency(format!(
                "record {} already holds key {}",
                id, existing
            ))),
        }
    }

    async fn find_by_key(&self, short_key: &str) -> Result<Option<UrlRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ShortenerError::database_connection("replica unreachable"));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.short_key.as_deref() == Some(short_key))
            .cloned())
    }

    async fn find_unkeyed(&self, limit: u64) -> Result<Vec<UrlRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.short_key.is_none())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_keys(&self, after_id: u64, limit: u64) -> Result<Vec<(u64, String)>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.id > after_id)
            .filter_map(|r| r.short_key.clone().map(|k| (r.id, k)))
            .take(limit as usize)
            .collect())
    }
}

// =============================================================================
// Caches
// =============================================================================

/// HashMap cache that records every call and remembers the last TTL.
#[derive(Default)]
pub struct MapCache {
    entries: Mutex<HashMap<String, String>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub last_ttl: Mutex<Option<Duration>>,
}

impl MapCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlCache for MapCache {
    fn name(&self) -> &'static str {
        "map"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.last_ttl.lock().unwrap() = Some(ttl);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Cache whose every call fails, as if Redis were down.
#[derive(Default)]
pub struct DownCache {
    pub calls: AtomicUsize,
}

impl DownCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl UrlCache for DownCache {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ShortenerError::cache_connection("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ShortenerError::cache_connection("connection refused"))
    }
}

/// Bit store whose writes fail while `failing_writes` is non-zero; each
/// failure counts it down, `usize::MAX` fails forever.
#[derive(Default)]
pub struct FlakyBits {
    inner: MemoryBitStore,
    pub failing_writes: AtomicUsize,
    pub write_attempts: AtomicUsize,
}

impl FlakyBits {
    pub fn failing(writes: usize) -> Arc<Self> {
        let bits = Self::default();
        bits.failing_writes.store(writes, Ordering::SeqCst);
        Arc::new(bits)
    }

    pub fn recover(&self) {
        self.failing_writes.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl BitStore for FlakyBits {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn set_bits(&self, positions: &[u64]) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failing_writes.load(Ordering::SeqCst);
        if left > 0 {
            if left != usize::MAX {
                self.failing_writes.store(left - 1, Ordering::SeqCst);
            }
            return Err(ShortenerError::cache_connection("connection reset by peer"));
        }
        self.inner.set_bits(positions).await
    }

    async fn get_bit(&self, position: u64) -> Result<bool> {
        self.inner.get_bit(position).await
    }
}

// =============================================================================
// SQLite fixtures
// =============================================================================

pub fn sqlite_url(dir: &TempDir, name: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(name).display())
}

pub async fn sqlite_primary(dir: &TempDir) -> SeaOrmStore {
    SeaOrmStore::connect(
        &sqlite_url(dir, "urls.db"),
        StoreRole::Primary,
        "primary",
        StoreOptions::default(),
    )
    .await
    .expect("Failed to open primary SQLite store")
}

/// Read-only handle on the primary's file, standing in for a replica.
pub async fn sqlite_replica(dir: &TempDir, label: &str) -> SeaOrmStore {
    SeaOrmStore::connect(
        &sqlite_url(dir, "urls.db"),
        StoreRole::Replica,
        label,
        StoreOptions::default(),
    )
    .await
    .expect("Failed to open replica SQLite store")
}
