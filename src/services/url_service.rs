//! Shortening and resolution
//!
//! Create runs insert → key update → filter add → cache write, strictly in
//! that order. When reads are prechecked against the filter, the filter add
//! moves ahead of the key update: a key only becomes resolvable from a store
//! once the filter holds it. Resolve is cache-aside over a replica read.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::cache::{MembershipFilter, UrlCache};
use crate::codec::{encode, is_valid_key};
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::storage::{StoreRouter, UrlRecord};

/// Attempts for a filter add that gates key assignment.
const FILTER_ADD_ATTEMPTS: u32 = 3;

const FILTER_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Prefix of returned short URLs, without trailing slash
    pub base_url: String,
    pub cache_ttl: Duration,
    /// Run insert and key update in one store transaction; unused when
    /// `precheck_reads` orders the filter add between them
    pub atomic_create: bool,
    /// Ask the filter before reading the store on a cache miss
    pub precheck_reads: bool,
}

impl ServiceSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(3600),
            atomic_create: true,
            precheck_reads: false,
        }
    }

    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache.default_ttl),
            atomic_create: config.database.atomic_create,
            precheck_reads: config.filter.enabled && config.filter.precheck_reads,
            ..Self::new(config.base_url.as_str())
        }
    }
}

/// A completed creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedUrl {
    pub id: u64,
    pub short_key: String,
    pub short_url: String,
    pub original_url: String,
}

/// Outcome of a resolve, including which layer answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Cached(String),
    Stored(String),
    NotFound,
}

impl Resolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolution::Cached(url) | Resolution::Stored(url) => Some(url),
            Resolution::NotFound => None,
        }
    }

    pub fn into_url(self) -> Option<String> {
        match self {
            Resolution::Cached(url) | Resolution::Stored(url) => Some(url),
            Resolution::NotFound => None,
        }
    }
}

pub struct UrlService {
    router: StoreRouter,
    cache: Arc<dyn UrlCache>,
    filter: Option<Arc<MembershipFilter>>,
    settings: ServiceSettings,
}

impl UrlService {
    pub fn new(
        router: StoreRouter,
        cache: Arc<dyn UrlCache>,
        filter: Option<Arc<MembershipFilter>>,
        settings: ServiceSettings,
    ) -> Self {
        info!(
            "UrlService ready: cache={}, filter={}, replicas={}, atomic_create={}",
            cache.name(),
            filter.is_some(),
            router.replica_count(),
            settings.atomic_create
        );
        Self {
            router,
            cache,
            filter,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn short_url(&self, short_key: &str) -> String {
        format!("{}/{}", self.settings.base_url, short_key)
    }

    /// Persist `original_url` and return its short URL.
    ///
    /// Only persistence failures fail the call. Filter and cache errors are
    /// logged and the creation still succeeds.
    ///
    /// With read prechecks on, the filter add is part of persistence: if it
    /// still fails after retries the call fails and the record stays unkeyed
    /// until `reconcile_orphans` picks it up.
    pub async fn shorten(&self, original_url: &str) -> Result<ShortenedUrl> {
        let record = match self.precheck_filter() {
            Some(filter) => self.persist_behind_filter(filter, original_url).await?,
            None => self.persist(original_url).await?,
        };
        let short_key = match record.short_key {
            Some(key) => key,
            None => encode(record.id),
        };

        if self.precheck_filter().is_none()
            && let Some(filter) = &self.filter
            && let Err(e) = filter.add(&short_key).await
        {
            warn!("Filter add failed for key '{}': {}", short_key, e);
        }

        if let Err(e) = self
            .cache
            .set(&short_key, original_url, self.settings.cache_ttl)
            .await
        {
            warn!("Cache write-through failed for key '{}': {}", short_key, e);
        }

        let short_url = self.short_url(&short_key);
        info!("Shortened record {} as '{}'", record.id, short_key);
        Ok(ShortenedUrl {
            id: record.id,
            short_key,
            short_url,
            original_url: original_url.to_string(),
        })
    }

    async fn persist(&self, original_url: &str) -> Result<UrlRecord> {
        let store = self.router.writer();

        if self.settings.atomic_create {
            return store.create_with_key(original_url, encode).await;
        }

        let mut record = store.insert(original_url).await?;
        let key = encode(record.id);
        if let Err(e) = store.update_short_key(record.id, &key).await {
            error!(
                "Record {} left without a key after update failure: {}",
                record.id, e
            );
            return Err(e);
        }
        record.short_key = Some(key);
        Ok(record)
    }

    /// Insert unkeyed, add the key to the filter, then assign it.
    async fn persist_behind_filter(
        &self,
        filter: &MembershipFilter,
        original_url: &str,
    ) -> Result<UrlRecord> {
        let store = self.router.writer();
        let mut record = store.insert(original_url).await?;
        let key = encode(record.id);

        if let Err(e) = add_with_retry(filter, &key).await {
            error!(
                "Record {} left without a key, filter add for '{}' failed: {}",
                record.id, key, e
            );
            return Err(e);
        }
        if let Err(e) = store.update_short_key(record.id, &key).await {
            error!(
                "Record {} left without a key after update failure: {}",
                record.id, e
            );
            return Err(e);
        }

        record.short_key = Some(key);
        Ok(record)
    }

    /// The filter, when resolve trusts its "definitely absent" answers.
    fn precheck_filter(&self) -> Option<&MembershipFilter> {
        if self.settings.precheck_reads {
            self.filter.as_deref()
        } else {
            None
        }
    }

    /// Look up the original URL for `short_key`.
    ///
    /// Keys that cannot be a base62 id answer `NotFound` without any I/O.
    /// Negative results are never cached.
    pub async fn resolve(&self, short_key: &str) -> Result<Resolution> {
        if !is_valid_key(short_key) {
            trace!("Rejected malformed key: {}", short_key);
            return Ok(Resolution::NotFound);
        }

        match self.cache.get(short_key).await {
            Ok(Some(url)) => {
                trace!("Cache hit for key: {}", short_key);
                return Ok(Resolution::Cached(url));
            }
            Ok(None) => trace!("Cache miss for key: {}", short_key),
            Err(e) => warn!("Cache read failed for key '{}', using store: {}", short_key, e),
        }

        if let Some(filter) = self.precheck_filter() {
            match filter.exists(short_key).await {
                Ok(false) => {
                    debug!("Filter reports '{}' absent", short_key);
                    return Ok(Resolution::NotFound);
                }
                Ok(true) => {}
                Err(e) => warn!("Filter check failed for key '{}': {}", short_key, e),
            }
        }

        let store = self.router.reader();
        let Some(record) = store.find_by_key(short_key).await? else {
            debug!("Key '{}' not found on '{}'", short_key, store.name());
            return Ok(Resolution::NotFound);
        };

        if let Err(e) = self
            .cache
            .set(short_key, &record.original_url, self.settings.cache_ttl)
            .await
        {
            warn!("Cache populate failed for key '{}': {}", short_key, e);
        }

        Ok(Resolution::Stored(record.original_url))
    }

    /// Assign keys to records an interrupted two-step create left unkeyed.
    ///
    /// Returns how many records were repaired.
    pub async fn reconcile_orphans(&self, batch_size: u64) -> Result<usize> {
        let store = self.router.writer();
        let batch_size = batch_size.max(1);
        let mut repaired = 0;

        loop {
            let orphans = store.find_unkeyed(batch_size).await?;
            if orphans.is_empty() {
                break;
            }
            let batch_len = orphans.len();

            for orphan in orphans {
                let key = encode(orphan.id);
                if let Some(filter) = self.precheck_filter() {
                    add_with_retry(filter, &key).await?;
                    store.update_short_key(orphan.id, &key).await?;
                } else {
                    store.update_short_key(orphan.id, &key).await?;
                    if let Some(filter) = &self.filter
                        && let Err(e) = filter.add(&key).await
                    {
                        warn!("Filter add failed for reconciled key '{}': {}", key, e);
                    }
                }
                repaired += 1;
            }

            if (batch_len as u64) < batch_size {
                break;
            }
        }

        if repaired > 0 {
            info!("Reconciled {} unkeyed records", repaired);
        } else {
            debug!("No unkeyed records found");
        }
        Ok(repaired)
    }

    /// Re-add every assigned key from the primary to the filter.
    ///
    /// Returns the number of keys added, zero when no filter is configured.
    pub async fn rebuild_filter(&self, batch_size: u64) -> Result<usize> {
        let Some(filter) = &self.filter else {
            debug!("No membership filter configured, nothing to rebuild");
            return Ok(0);
        };

        let store = self.router.writer();
        let batch_size = batch_size.max(1);
        let mut after_id = 0;
        let mut added = 0;

        loop {
            let page = store.list_keys(after_id, batch_size).await?;
            let Some(&(last_id, _)) = page.last() else {
                break;
            };

            for (_, key) in &page {
                filter.add(key).await?;
            }
            added += page.len();
            after_id = last_id;

            if (page.len() as u64) < batch_size {
                break;
            }
        }

        info!("Membership filter rebuilt with {} keys", added);
        Ok(added)
    }
}

/// Add `key`, retrying cache-layer failures with a growing delay.
async fn add_with_retry(filter: &MembershipFilter, key: &str) -> Result<()> {
    let mut attempt = 1;
    loop {
        match filter.add(key).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_cache_layer() && attempt < FILTER_ADD_ATTEMPTS => {
                warn!(
                    "Filter add for '{}' failed (attempt {}/{}): {}",
                    key, attempt, FILTER_ADD_ATTEMPTS, e
                );
                tokio::time::sleep(FILTER_RETRY_DELAY * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
