use std::str::FromStr;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use super::{DbKind, StoreOptions};
use crate::errors::{Result, ShortenerError};
use migration::{Migrator, MigratorTrait};

/// Open a SQLite pool in WAL mode, creating the file if needed.
pub async fn connect_sqlite(database_url: &str, options: &StoreOptions) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
    };

    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            ShortenerError::database_config(format!("invalid SQLite URL '{}': {}", database_url, e))
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .pragma("cache_size", "-64000")
        .pragma("temp_store", "memory");

    let pool = SqlitePoolOptions::new()
        .max_connections(options.pool_size.max(1))
        .acquire_timeout(options.timeout)
        .connect_with(opt)
        .await
        .map_err(|e| {
            ShortenerError::database_connection(format!("cannot open SQLite database: {}", e))
        })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Open a MySQL/MariaDB or PostgreSQL pool.
pub async fn connect_generic(
    database_url: &str,
    kind: DbKind,
    options: &StoreOptions,
) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(options.pool_size)
        .min_connections(options.pool_size.min(5))
        .connect_timeout(options.timeout)
        .acquire_timeout(options.timeout)
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        ShortenerError::database_connection(format!(
            "cannot connect to {} database: {}",
            kind.as_ref(),
            e
        ))
    })
}

/// Bring the schema up to date. Only ever run against the primary.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| ShortenerError::database_operation(format!("migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}
