use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted shortening mapping.
///
/// `short_key` stays `None` only between the insert that assigns `id` and the
/// key update; afterwards it always equals the base62 form of `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: u64,
    pub original_url: String,
    pub short_key: Option<String>,
    #[serde(default)]
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

impl UrlRecord {
    pub fn is_keyed(&self) -> bool {
        self.short_key.is_some()
    }
}

/// Whether a store handle may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Primary,
    Replica,
}

impl StoreRole {
    pub fn is_read_only(self) -> bool {
        matches!(self, StoreRole::Replica)
    }
}
