//! Shared Redis connection handle
//!
//! Both the URL cache and the filter bit array talk to Redis through this
//! handle: one multiplexed connection, created on first use and dropped
//! after an error so the next call reconnects.

use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{Result, ShortenerError};

#[derive(Clone)]
pub struct RedisHandle {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl RedisHandle {
    /// Parse the URL without connecting.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            ShortenerError::cache_connection(format!("Invalid Redis URL '{}': {}", url, e))
        })?;

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Open the handle and verify the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self> {
        let handle = Self::open(url)?;
        let mut conn = handle.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Redis connection test successful: {}", pong);
        Ok(handle)
    }

    /// 获取或建立持久连接
    pub async fn connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ShortenerError::cache_connection(format!("Redis connect failed: {e}")))?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    pub async fn reset(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// Run `op` on the shared connection, dropping the connection if it fails.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        let conn = match self.connection().await {
            Ok(c) => c,
            Err(e) => {
                self.reset().await;
                return Err(e);
            }
        };

        match op(conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.reset().await;
                Err(e.into())
            }
        }
    }
}
