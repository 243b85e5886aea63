//! Identifier store
//!
//! Durable `id → (original_url, short_key)` mapping. The store assigns ids
//! from its own auto-increment counter; keys are derived from them.

use async_trait::async_trait;

use crate::errors::Result;

pub mod backend;
pub mod models;
pub mod router;

pub use backend::{DbKind, SeaOrmStore, StoreOptions, infer_backend_from_url};
pub use models::{StoreRole, UrlRecord};
pub use router::{RandomSelector, ReplicaSelector, RoundRobinSelector, StoreRouter, selector_for};

/// Turns an assigned id into its short key.
pub type KeyEncoder = fn(u64) -> String;

#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Label used in logs, e.g. `primary` or `replica-0`.
    fn name(&self) -> &str;

    /// Insert a record with a null key and return it with its new id.
    async fn insert(&self, original_url: &str) -> Result<UrlRecord>;

    /// Set the key of row `id`.
    ///
    /// Succeeds when the key was null or already equal to `short_key`. A
    /// missing row or a different existing key is a consistency error.
    async fn update_short_key(&self, id: u64, short_key: &str) -> Result<()>;

    async fn find_by_key(&self, short_key: &str) -> Result<Option<UrlRecord>>;

    /// Insert then assign `encoder(id)` as the key.
    ///
    /// This default runs the two statements one after the other, so a failure
    /// in between leaves an unkeyed row. Backends with transactions override it.
    async fn create_with_key(&self, original_url: &str, encoder: KeyEncoder) -> Result<UrlRecord> {
        let mut record = self.insert(original_url).await?;
        let key = encoder(record.id);
        self.update_short_key(record.id, &key).await?;
        record.short_key = Some(key);
        Ok(record)
    }

    /// Records whose key was never assigned, oldest first.
    async fn find_unkeyed(&self, limit: u64) -> Result<Vec<UrlRecord>>;

    /// `(id, short_key)` pairs with `id > after_id`, ascending by id.
    async fn list_keys(&self, after_id: u64, limit: u64) -> Result<Vec<(u64, String)>>;
}
