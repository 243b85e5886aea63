use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::errors::{Result, ShortenerError};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 优先级：ENV > config.toml > 默认值
/// ENV 前缀：SHORTENER，分隔符：__
/// 示例：SHORTENER__SERVER__PORT=9999
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Prefix of every returned short URL, e.g. `https://sho.rt`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            filter: FilterConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    pub fn load(path: &str) -> Result<Self> {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SHORTENER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("database.replica_urls")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        let config: StaticConfig = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ShortenerError::config(format!("Failed to load configuration: {e}")))?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.base_url).map_err(|e| {
            ShortenerError::config(format!("Invalid base_url '{}': {}", self.base_url, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ShortenerError::config(format!(
                "base_url must use http or https, got '{}'",
                base.scheme()
            )));
        }

        if self.database.primary_url.trim().is_empty() {
            return Err(ShortenerError::config("database.primary_url is empty"));
        }
        if self.cache.default_ttl == 0 {
            return Err(ShortenerError::config("cache.default_ttl must be positive"));
        }
        if self.filter.enabled {
            crate::cache::filter::FilterParams::optimal(
                self.filter.expected_items,
                self.filter.false_positive_rate,
            )?;
            // 过滤器必须先包含所有已存储的键，才能信任它的否定结果
            if self.filter.precheck_reads && !self.filter.rebuild_on_startup {
                return Err(ShortenerError::config(
                    "filter.precheck_reads requires filter.rebuild_on_startup",
                ));
            }
        }

        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShortenerError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// Read replica selection policy
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplicaStrategy {
    #[default]
    Random,
    RoundRobin,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Primary store, receives every write
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    /// Read-only copies of the primary; empty means reads go to the primary
    #[serde(default)]
    pub replica_urls: Vec<String>,
    #[serde(default)]
    pub replica_strategy: ReplicaStrategy,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Run insert and key update in one transaction
    #[serde(default = "default_true")]
    pub atomic_create: bool,
    /// Assign keys to orphaned rows before serving
    #[serde(default = "default_true")]
    pub reconcile_on_startup: bool,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
    None,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type", default)]
    pub cache_type: CacheBackend,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterBackend {
    #[default]
    Redis,
    Memory,
}

/// Membership filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: FilterBackend,
    /// Expected number of keys (n)
    #[serde(default = "default_filter_expected_items")]
    pub expected_items: u64,
    /// Target false-positive probability (p)
    #[serde(default = "default_filter_fp_rate")]
    pub false_positive_rate: f64,
    /// Redis connection for the bit array; falls back to `cache.redis.url`
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_filter_redis_key")]
    pub redis_key: String,
    /// Answer not-found on a definite filter miss without reading a store
    #[serde(default)]
    pub precheck_reads: bool,
    /// Re-add every stored key to the filter before serving
    #[serde(default)]
    pub rebuild_on_startup: bool,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_primary_url() -> String {
    "sqlite://shortener.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "shortener:".to_string()
}

fn default_memory_capacity() -> u64 {
    100_000
}

fn default_filter_expected_items() -> u64 {
    100_000_000
}

fn default_filter_fp_rate() -> f64 {
    0.01
}

fn default_filter_redis_key() -> String {
    "filter:url_bloom".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            replica_urls: Vec::new(),
            replica_strategy: ReplicaStrategy::default(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            atomic_create: true,
            reconcile_on_startup: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheBackend::default(),
            default_ttl: default_cache_ttl(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: FilterBackend::default(),
            expected_items: default_filter_expected_items(),
            false_positive_rate: default_filter_fp_rate(),
            redis_url: None,
            redis_key: default_filter_redis_key(),
            precheck_reads: false,
            rebuild_on_startup: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: default_cors_origins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
