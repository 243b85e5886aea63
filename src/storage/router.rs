//! Read/write split between the primary and its replicas

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::config::ReplicaStrategy;
use crate::storage::UrlStore;

/// Chooses which replica serves a read.
pub trait ReplicaSelector: Send + Sync {
    /// Index in `0..replica_count`. Only called with `replica_count > 0`.
    fn pick(&self, replica_count: usize) -> usize;
}

/// Uniform random choice per request.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl ReplicaSelector for RandomSelector {
    fn pick(&self, replica_count: usize) -> usize {
        rand::random_range(0..replica_count)
    }
}

#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    next: AtomicUsize,
}

impl ReplicaSelector for RoundRobinSelector {
    fn pick(&self, replica_count: usize) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % replica_count
    }
}

pub fn selector_for(strategy: ReplicaStrategy) -> Arc<dyn ReplicaSelector> {
    match strategy {
        ReplicaStrategy::Random => Arc::new(RandomSelector),
        ReplicaStrategy::RoundRobin => Arc::new(RoundRobinSelector::default()),
    }
}

/// Writes always go to the primary; reads go to a replica when any exist.
#[derive(Clone)]
pub struct StoreRouter {
    primary: Arc<dyn UrlStore>,
    replicas: Vec<Arc<dyn UrlStore>>,
    selector: Arc<dyn ReplicaSelector>,
}

impl StoreRouter {
    /// Router without replicas; reads use the primary.
    pub fn new(primary: Arc<dyn UrlStore>) -> Self {
        Self::with_replicas(primary, Vec::new(), Arc::new(RandomSelector))
    }

    pub fn with_replicas(
        primary: Arc<dyn UrlStore>,
        replicas: Vec<Arc<dyn UrlStore>>,
        selector: Arc<dyn ReplicaSelector>,
    ) -> Self {
        Self {
            primary,
            replicas,
            selector,
        }
    }

    pub fn writer(&self) -> &Arc<dyn UrlStore> {
        &self.primary
    }

    pub fn reader(&self) -> &Arc<dyn UrlStore> {
        if self.replicas.is_empty() {
            return &self.primary;
        }
        // 自定义 selector 的返回值可能越界
        let index = self.selector.pick(self.replicas.len()) % self.replicas.len();
        let replica = &self.replicas[index];
        debug!("Routing read to '{}'", replica.name());
        replica
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::storage::UrlRecord;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct Named(&'static str);

    #[async_trait]
    impl UrlStore for Named {
        fn name(&self) -> &str {
            self.0
        }
        async fn insert(&self, _original_url: &str) -> Result<UrlRecord> {
            unimplemented!()
        }
        async fn update_short_key(&self, _id: u64, _short_key: &str) -> Result<()> {
            unimplemented!()
        }
        async fn find_by_key(&self, _short_key: &str) -> Result<Option<UrlRecord>> {
            Ok(None)
        }
        async fn find_unkeyed(&self, _limit: u64) -> Result<Vec<UrlRecord>> {
            Ok(vec![])
        }
        async fn list_keys(&self, _after_id: u64, _limit: u64) -> Result<Vec<(u64, String)>> {
            Ok(vec![])
        }
    }

    fn router(replicas: &[&'static str], selector: Arc<dyn ReplicaSelector>) -> StoreRouter {
        StoreRouter::with_replicas(
            Arc::new(Named("primary")),
            replicas
                .iter()
                .map(|n| Arc::new(Named(*n)) as Arc<dyn UrlStore>)
                .collect(),
            selector,
        )
    }

    #[test]
    fn test_no_replicas_reads_from_primary() {
        let router = StoreRouter::new(Arc::new(Named("primary")));
        assert_eq!(router.reader().name(), "primary");
        assert_eq!(router.writer().name(), "primary");
        assert_eq!(router.replica_count(), 0);
    }

    #[test]
    fn test_writes_never_hit_replicas() {
        let router = router(&["replica-0", "replica-1"], Arc::new(RandomSelector));
        for _ in 0..50 {
            assert_eq!(router.writer().name(), "primary");
        }
    }

    #[test]
    fn test_random_selector_spreads_reads() {
        let router = router(&["replica-0", "replica-1", "replica-2"], Arc::new(RandomSelector));
        let seen: HashSet<String> = (0..300)
            .map(|_| router.reader().name().to_string())
            .collect();
        assert_eq!(seen.len(), 3);
        assert!(!seen.contains("primary"));
    }

    #[test]
    fn test_round_robin_cycles_in_order() {
        let router = router(
            &["replica-0", "replica-1"],
            Arc::new(RoundRobinSelector::default()),
        );
        let names: Vec<String> = (0..4).map(|_| router.reader().name().to_string()).collect();
        assert_eq!(names, ["replica-0", "replica-1", "replica-0", "replica-1"]);
    }

    #[test]
    fn test_selector_for_strategy() {
        let selector = selector_for(ReplicaStrategy::RoundRobin);
        assert_eq!(selector.pick(3), 0);
        assert_eq!(selector.pick(3), 1);
        assert!(selector_for(ReplicaStrategy::Random).pick(5) < 5);
    }
}
