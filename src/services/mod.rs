//! Service layer
//!
//! Business logic shared by the HTTP handlers and the CLI maintenance
//! commands. Collaborators are injected; the service never opens connections.

mod url_service;

pub use url_service::{Resolution, ServiceSettings, ShortenedUrl, UrlService};
