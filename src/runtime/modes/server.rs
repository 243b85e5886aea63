//! Server mode
//!
//! Builds the service from config and serves the HTTP routes until the
//! server exits or Ctrl+C arrives.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::configure_routes;
use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::AppStartTime;
use crate::config::{CorsConfig, get_config};
use crate::runtime::lifetime;

/// Warn about CORS settings that allow nothing (runs once, not per worker).
fn validate_cors_config(cors: &CorsConfig) {
    if cors.enabled && cors.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
             No cross-origin requests will be allowed. \
             Use [\"*\"] for any origin."
        );
    }
}

/// Disabled CORS keeps the browser's same-origin default.
pub fn build_cors_middleware(cors: &CorsConfig) -> Cors {
    if !cors.enabled {
        return Cors::default();
    }

    let base = Cors::default()
        .allowed_methods(["GET", "HEAD", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600);

    if cors.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_any_origin();
    }

    cors.allowed_origins
        .iter()
        .fold(base, |acc, origin| acc.allowed_origin(origin))
}

/// Run the HTTP server with the global configuration.
///
/// Logging and `init_config` must be done before calling this.
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime::now();
    let config = get_config();
    let config = config.as_ref();

    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let service = web::Data::from(startup.service.clone());
    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);

    let workers = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} workers for the server", workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors_middleware(&cors_config))
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .app_data(service.clone())
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(configure_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(workers)
    .disable_signals();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    let handle = server.handle();

    let served = tokio::select! {
        res = server => res.context("HTTP server error"),
        _ = lifetime::shutdown::wait_for_signal() => {
            handle.stop(true).await;
            warn!("HTTP server stopped");
            Ok(())
        }
    };

    lifetime::shutdown::close_store(startup.primary.get_db().clone()).await;
    served
}
