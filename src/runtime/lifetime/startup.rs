use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::redis_conn::RedisHandle;
use crate::cache::{CacheFactory, MembershipFilter};
use crate::config::{CacheBackend, DatabaseConfig, FilterBackend, StaticConfig};
use crate::services::{ServiceSettings, UrlService};
use crate::storage::{
    SeaOrmStore, StoreOptions, StoreRole, StoreRouter, UrlStore, selector_for,
};

/// Page size for the reconcile and filter rebuild sweeps.
pub const MAINTENANCE_BATCH_SIZE: u64 = 500;

pub struct StartupContext {
    pub service: Arc<UrlService>,
    /// Primary handle, kept to close the pool on shutdown
    pub primary: SeaOrmStore,
}

/// Install the process-wide TLS provider used by Redis and database TLS.
pub fn install_crypto_provider() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))
}

/// Connect the primary (running migrations) and every replica.
pub async fn build_router(config: &DatabaseConfig) -> Result<(StoreRouter, SeaOrmStore)> {
    let options = StoreOptions::from(config);

    let primary = SeaOrmStore::connect(&config.primary_url, StoreRole::Primary, "primary", options)
        .await
        .context("Failed to connect to the primary store")?;

    let mut replicas: Vec<Arc<dyn UrlStore>> = Vec::with_capacity(config.replica_urls.len());
    for (index, url) in config.replica_urls.iter().enumerate() {
        let replica = SeaOrmStore::connect(
            url,
            StoreRole::Replica,
            format!("replica-{}", index),
            options,
        )
        .await
        .with_context(|| format!("Failed to connect to replica {}", index))?;
        replicas.push(Arc::new(replica));
    }

    if replicas.is_empty() {
        info!("No replicas configured, reads use the primary");
    } else {
        info!(
            "{} replicas configured, strategy: {}",
            replicas.len(),
            config.replica_strategy.as_ref()
        );
    }

    let router = StoreRouter::with_replicas(
        Arc::new(primary.clone()),
        replicas,
        selector_for(config.replica_strategy),
    );
    Ok((router, primary))
}

/// `cache.redis.url` when the URL cache or the filter bit array will talk to
/// it, so both share one connection.
fn shared_redis_url(config: &StaticConfig) -> Option<&str> {
    let cache_uses_redis = config.cache.cache_type == CacheBackend::Redis;
    let filter_uses_redis = config.filter.enabled
        && config.filter.backend == FilterBackend::Redis
        && config.filter.redis_url.is_none();

    (cache_uses_redis || filter_uses_redis).then_some(config.cache.redis.url.as_str())
}

/// Wire stores, cache and filter into a `UrlService`.
pub async fn build_service(config: &StaticConfig) -> Result<StartupContext> {
    let (router, primary) = build_router(&config.database).await?;

    let shared_redis = match shared_redis_url(config) {
        Some(url) => Some(
            RedisHandle::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?,
        ),
        None => None,
    };

    let cache = CacheFactory::create(&config.cache, shared_redis.clone())
        .await
        .context("Failed to create URL cache")?;

    let filter = MembershipFilter::from_config(&config.filter, shared_redis.as_ref())
        .await
        .context("Failed to create membership filter")?;

    let service = Arc::new(UrlService::new(
        router,
        cache,
        filter,
        ServiceSettings::from_config(config),
    ));

    Ok(StartupContext { service, primary })
}

/// Build the service and run the startup sweeps the config asks for.
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let context = build_service(config).await?;

    if config.database.reconcile_on_startup {
        match context
            .service
            .reconcile_orphans(MAINTENANCE_BATCH_SIZE)
            .await
        {
            Ok(0) => debug!("Startup reconcile: nothing to repair"),
            Ok(n) => info!("Startup reconcile repaired {} records", n),
            Err(e) => warn!("Startup reconcile failed (non-fatal): {}", e),
        }
    }

    if config.filter.enabled && config.filter.rebuild_on_startup {
        let added = context
            .service
            .rebuild_filter(MAINTENANCE_BATCH_SIZE)
            .await
            .context("Failed to rebuild membership filter")?;
        info!("Startup filter rebuild added {} keys", added);
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
