use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Resolve once Ctrl+C arrives (or listening for it fails).
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

/// Close the primary pool, giving up after a bounded wait.
pub async fn close_store(db: DatabaseConnection) {
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), db.close()).await {
        Ok(Ok(())) => info!("Primary store connections closed"),
        Ok(Err(e)) => error!("Failed to close primary store connections: {}", e),
        Err(_) => error!(
            "Closing primary store timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
