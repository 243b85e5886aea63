pub mod health;
pub mod redirect;
pub mod shorten;

use actix_web::web;

pub use health::{AppStartTime, HealthResponse, HealthService};
pub use redirect::RedirectService;
pub use shorten::{ShortenRequest, ShortenResponse, ShortenService};

use crate::api::response::json_error_handler;

/// 请求体上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Register every route. `/{short_key}` must come last so it does not
/// shadow `/health` and `/shorten`.
///
/// Expects `web::Data<UrlService>` and `web::Data<AppStartTime>` on the app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(json_error_handler),
    )
    .route("/health", web::get().to(HealthService::health_check))
    .route("/health", web::head().to(HealthService::health_check))
    .route("/shorten", web::post().to(ShortenService::shorten))
    .route("/{short_key}", web::get().to(RedirectService::handle_redirect))
    .route("/{short_key}", web::head().to(RedirectService::handle_redirect));
}
