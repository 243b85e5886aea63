//! SeaORM store backend
//!
//! Supports SQLite, MySQL/MariaDB and PostgreSQL. The backend is inferred
//! from the connection URL.

mod connection;
mod operations;
pub mod retry;

use std::time::Duration;

use sea_orm::DatabaseConnection;
use strum::AsRefStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::StoreRole;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DbKind {
    Sqlite,
    Mysql,
    Postgres,
}

/// Infer the database backend from a connection URL.
pub fn infer_backend_from_url(database_url: &str) -> Result<DbKind> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok(DbKind::Sqlite)
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok(DbKind::Mysql)
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok(DbKind::Postgres)
    } else {
        Err(ShortenerError::database_config(format!(
            "cannot infer database type from URL '{}'; expected sqlite://, mysql://, mariadb:// or postgres://",
            database_url
        )))
    }
}

/// Pool and retry settings shared by every handle.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub pool_size: u32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&DatabaseConfig> for StoreOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            timeout: Duration::from_secs(config.timeout),
            retry: RetryPolicy::from(config),
        }
    }
}

/// One database handle, either the primary or a read-only replica.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    label: String,
    role: StoreRole,
    retry: RetryPolicy,
}

impl SeaOrmStore {
    /// Connect to `database_url`. Migrations run when `role` is primary.
    pub async fn connect(
        database_url: &str,
        role: StoreRole,
        label: impl Into<String>,
        options: StoreOptions,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortenerError::database_config("database URL is empty"));
        }

        let kind = infer_backend_from_url(database_url)?;
        let db = match kind {
            DbKind::Sqlite => connect_sqlite(database_url, &options).await?,
            DbKind::Mysql | DbKind::Postgres => {
                connect_generic(database_url, kind, &options).await?
            }
        };

        if role == StoreRole::Primary {
            run_migrations(&db).await?;
        }

        let store = Self::from_connection(db, role, label, options.retry);
        info!(
            "{} store '{}' connected ({:?})",
            kind.as_ref().to_uppercase(),
            store.label,
            role
        );
        Ok(store)
    }

    /// Wrap an existing connection without touching the schema.
    pub fn from_connection(
        db: DatabaseConnection,
        role: StoreRole,
        label: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db,
            label: label.into(),
            role,
            retry,
        }
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.role.is_read_only() {
            return Err(ShortenerError::database_operation(format!(
                "store '{}' is a read-only replica",
                self.label
            )));
        }
        Ok(())
    }
}
