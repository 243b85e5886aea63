//! Cache layer
//!
//! - `url_cache`: short key → original URL, write-through on create and
//!   lazily filled on resolve
//! - `filter`: shared membership filter over short keys
//! - `redis_conn`: connection handle shared by the Redis backends

pub mod filter;
pub mod redis_conn;
pub mod traits;
pub mod url_cache;

pub use filter::{FilterParams, MembershipFilter};
pub use traits::{BitStore, UrlCache};
pub use url_cache::CacheFactory;
