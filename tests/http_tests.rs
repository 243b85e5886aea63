//! HTTP surface tests with actix test services

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use shortener::api::configure_routes;
use shortener::api::middleware::RequestIdMiddleware;
use shortener::api::services::AppStartTime;
use shortener::services::{ServiceSettings, UrlService};
use shortener::storage::StoreRouter;

use common::{MapCache, MemoryStore};

fn url_service(store: Arc<MemoryStore>) -> Arc<UrlService> {
    Arc::new(UrlService::new(
        StoreRouter::new(store),
        MapCache::new(),
        None,
        ServiceSettings::new("http://sho.rt"),
    ))
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($service))
                .app_data(web::Data::new(AppStartTime::now()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_shorten_returns_created() {
    let app = app!(url_service(MemoryStore::primary()));

    let req = test::TestRequest::post()
        .uri("/shorten")
        .set_json(json!({ "url": "https://example.org" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "short_url": "http://sho.rt/1", "original_url": "https://example.org" })
    );
}

#[actix_rt::test]
async fn test_redirect_after_shorten() {
    let app = app!(url_service(MemoryStore::primary()));

    let req = test::TestRequest::post()
        .uri("/shorten")
        .set_json(json!({ "url": "https://example.org/page?q=1" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "https://example.org/page?q=1"
    );

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "https://example.org/page?q=1"
    );
}

#[actix_rt::test]
async fn test_unknown_key_is_404() {
    let app = app!(url_service(MemoryStore::primary()));

    for uri in ["/doesnotexist", "/zz"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "detail": "URL not found" }));
    }
}

#[actix_rt::test]
async fn test_invalid_urls_are_422() {
    let store = MemoryStore::primary();
    let app = app!(url_service(store.clone()));

    for url in ["", "not a url", "javascript:alert(1)", "ftp://example.org", " https://example.org"] {
        let req = test::TestRequest::post()
            .uri("/shorten")
            .set_json(json!({ "url": url }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "url {:?}", url);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());
    }
    assert_eq!(store.len(), 0);
}

#[actix_rt::test]
async fn test_malformed_body_is_422() {
    let app = app!(url_service(MemoryStore::primary()));

    let req = test::TestRequest::post()
        .uri("/shorten")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"url\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/shorten")
        .set_json(json!({ "link": "https://example.org" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("url"));
}

#[actix_rt::test]
async fn test_store_failure_is_500_without_internals() {
    let store = MemoryStore::primary();
    store.fail_inserts.store(true, Ordering::SeqCst);
    let app = app!(url_service(store.clone()));

    let req = test::TestRequest::post()
        .uri("/shorten")
        .set_json(json!({ "url": "https://example.org" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "detail": "Failed to process the request." }));

    store.fail_reads.store(true, Ordering::SeqCst);
    let req = test::TestRequest::get().uri("/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_rt::test]
async fn test_health() {
    let app = app!(url_service(MemoryStore::primary()));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "url-shortener");
    assert!(body["uptime"].is_u64());
}

#[actix_rt::test]
async fn test_request_id_header() {
    let app = test::init_service(
        App::new()
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::from(url_service(MemoryStore::primary())))
            .app_data(web::Data::new(AppStartTime::now()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    let generated = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-request-id", "upstream-42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "upstream-42");
}
