use actix_web::http::header;
use actix_web::{HttpResponse, Responder, web};
use tracing::{error, trace};

use crate::api::response::{internal_error, not_found};
use crate::services::UrlService;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        service: web::Data<UrlService>,
    ) -> impl Responder {
        let short_key = path.into_inner();

        match service.resolve(&short_key).await {
            Ok(resolution) => {
                trace!("Resolved '{}': {:?}", short_key, resolution);
                match resolution.into_url() {
                    Some(url) => HttpResponse::MovedPermanently()
                        .insert_header((header::LOCATION, url))
                        .finish(),
                    None => not_found(),
                }
            }
            Err(e) => {
                error!("Lookup failed for key '{}': {}", short_key, e);
                internal_error()
            }
        }
    }
}
