//! HTTP interface
//!
//! - `POST /shorten`: create a short URL
//! - `GET|HEAD /{short_key}`: 301 to the original URL
//! - `GET|HEAD /health`: liveness

pub mod middleware;
pub mod response;
pub mod services;

pub use services::configure_routes;
