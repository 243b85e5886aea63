use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::api::response::{internal_error, unprocessable};
use crate::services::UrlService;
use crate::utils::validate_url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_url: String,
    pub original_url: String,
}

pub struct ShortenService;

impl ShortenService {
    pub async fn shorten(
        service: web::Data<UrlService>,
        body: web::Json<ShortenRequest>,
    ) -> impl Responder {
        let ShortenRequest { url } = body.into_inner();

        if let Err(e) = validate_url(&url) {
            debug!("Rejected URL '{}': {}", url, e);
            return unprocessable(e.to_string());
        }

        match service.shorten(&url).await {
            Ok(created) => HttpResponse::Created().json(ShortenResponse {
                short_url: created.short_url,
                original_url: created.original_url,
            }),
            Err(e) => {
                error!("Failed to shorten URL: {}", e);
                internal_error()
            }
        }
    }
}
