use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortenerError {
    Validation(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Consistency(String),
    CacheConnection(String),
    CacheOperation(String),
    FilterConfig(String),
    Config(String),
    Serialization(String),
    FileOperation(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::Validation(_) => "E001",
            ShortenerError::DatabaseConfig(_) => "E002",
            ShortenerError::DatabaseConnection(_) => "E003",
            ShortenerError::DatabaseOperation(_) => "E004",
            ShortenerError::Consistency(_) => "E005",
            ShortenerError::CacheConnection(_) => "E006",
            ShortenerError::CacheOperation(_) => "E007",
            ShortenerError::FilterConfig(_) => "E008",
            ShortenerError::Config(_) => "E009",
            ShortenerError::Serialization(_) => "E010",
            ShortenerError::FileOperation(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::Validation(_) => "Validation Error",
            ShortenerError::DatabaseConfig(_) => "Database Configuration Error",
            ShortenerError::DatabaseConnection(_) => "Database Connection Error",
            ShortenerError::DatabaseOperation(_) => "Database Operation Error",
            ShortenerError::Consistency(_) => "Consistency Error",
            ShortenerError::CacheConnection(_) => "Cache Connection Error",
            ShortenerError::CacheOperation(_) => "Cache Operation Error",
            ShortenerError::FilterConfig(_) => "Filter Configuration Error",
            ShortenerError::Config(_) => "Configuration Error",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::Validation(msg)
            | ShortenerError::DatabaseConfig(msg)
            | ShortenerError::DatabaseConnection(msg)
            | ShortenerError::DatabaseOperation(msg)
            | ShortenerError::Consistency(msg)
            | ShortenerError::CacheConnection(msg)
            | ShortenerError::CacheOperation(msg)
            | ShortenerError::FilterConfig(msg)
            | ShortenerError::Config(msg)
            | ShortenerError::Serialization(msg)
            | ShortenerError::FileOperation(msg) => msg,
        }
    }

    /// Errors raised by the primary or a replica store.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            ShortenerError::DatabaseConfig(_)
                | ShortenerError::DatabaseConnection(_)
                | ShortenerError::DatabaseOperation(_)
                | ShortenerError::Consistency(_)
        )
    }

    /// Errors raised by the cache or the membership filter's bit store.
    ///
    /// These are the ones worth retrying; configuration errors are not.
    pub fn is_cache_layer(&self) -> bool {
        matches!(
            self,
            ShortenerError::CacheConnection(_) | ShortenerError::CacheOperation(_)
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseOperation(msg.into())
    }

    pub fn consistency<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Consistency(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CacheConnection(msg.into())
    }

    pub fn cache_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CacheOperation(msg.into())
    }

    pub fn filter_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::FilterConfig(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::FileOperation(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for ShortenerError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            ShortenerError::CacheConnection(err.to_string())
        } else {
            ShortenerError::CacheOperation(err.to_string())
        }
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;
