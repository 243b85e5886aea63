use std::time::Duration;

use async_trait::async_trait;

use crate::cache::UrlCache;
use crate::errors::Result;

/// Cache that stores nothing; every lookup goes to a store.
#[derive(Default)]
pub struct NullUrlCache;

#[async_trait]
impl UrlCache for NullUrlCache {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}
