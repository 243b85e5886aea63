//! SeaOrmStore tests on SQLite files in a temp dir

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use shortener::codec::encode;
use shortener::errors::ShortenerError;
use shortener::storage::{StoreRole, StoreRouter, UrlStore};

use common::{sqlite_primary, sqlite_replica};

#[tokio::test]
async fn test_insert_assigns_sequential_ids() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let a = store.insert("https://example.org/a").await.unwrap();
    let b = store.insert("https://example.org/b").await.unwrap();

    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert_eq!(a.short_key, None);
    assert_eq!(a.clicks, 0);
    assert_eq!(b.original_url, "https://example.org/b");
}

#[tokio::test]
async fn test_update_then_find() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let record = store.insert("https://example.org").await.unwrap();
    store.update_short_key(record.id, "1").await.unwrap();

    let found = store.find_by_key("1").await.unwrap().unwrap();
    assert_eq!(found.id, 1);
    assert_eq!(found.original_url, "https://example.org");
    assert!(found.is_keyed());

    assert!(store.find_by_key("2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_is_idempotent_for_same_key() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let record = store.insert("https://example.org").await.unwrap();
    store.update_short_key(record.id, "1").await.unwrap();
    store.update_short_key(record.id, "1").await.unwrap();
}

#[tokio::test]
async fn test_update_refuses_different_key() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let record = store.insert("https://example.org").await.unwrap();
    store.update_short_key(record.id, "1").await.unwrap();

    let err = store.update_short_key(record.id, "2").await.unwrap_err();
    assert!(matches!(err, ShortenerError::Consistency(_)));
    assert_eq!(
        store.find_by_key("1").await.unwrap().unwrap().id,
        record.id
    );
}

#[tokio::test]
async fn test_update_missing_row_is_consistency_error() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let err = store.update_short_key(42, "G").await.unwrap_err();
    assert!(matches!(err, ShortenerError::Consistency(_)));
}

#[tokio::test]
async fn test_create_with_key_commits_keyed_row() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    let first = store.create_with_key("https://example.org/1", encode).await.unwrap();
    let second = store.create_with_key("https://example.org/2", encode).await.unwrap();

    assert_eq!(first.short_key.as_deref(), Some("1"));
    assert_eq!(second.short_key.as_deref(), Some("2"));
    assert!(store.find_unkeyed(10).await.unwrap().is_empty());
    assert_eq!(
        store.find_by_key("2").await.unwrap().unwrap().original_url,
        "https://example.org/2"
    );
}

#[tokio::test]
async fn test_find_unkeyed_orders_by_id() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    for i in 1..=5 {
        store.insert(&format!("https://example.org/{}", i)).await.unwrap();
    }
    store.update_short_key(2, "2").await.unwrap();

    let unkeyed: Vec<u64> = store
        .find_unkeyed(3)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(unkeyed, vec![1, 3, 4]);
}

#[tokio::test]
async fn test_list_keys_pages_after_id() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_primary(&dir).await;

    for i in 1..=5u64 {
        let record = store.insert(&format!("https://example.org/{}", i)).await.unwrap();
        if i != 3 {
            store.update_short_key(record.id, &encode(record.id)).await.unwrap();
        }
    }

    let first = store.list_keys(0, 2).await.unwrap();
    assert_eq!(first, vec![(1, "1".to_string()), (2, "2".to_string())]);

    let rest = store.list_keys(2, 10).await.unwrap();
    assert_eq!(rest, vec![(4, "4".to_string()), (5, "5".to_string())]);

    assert!(store.list_keys(5, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replica_reads_but_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let primary = sqlite_primary(&dir).await;
    let replica = sqlite_replica(&dir, "replica-0").await;

    assert_eq!(replica.role(), StoreRole::Replica);
    primary.create_with_key("https://example.org", encode).await.unwrap();

    let found = replica.find_by_key("1").await.unwrap().unwrap();
    assert_eq!(found.original_url, "https://example.org");

    assert!(replica.insert("https://example.org/x").await.is_err());
    assert!(replica.update_short_key(1, "1").await.is_err());
    assert!(replica.create_with_key("https://example.org/y", encode).await.is_err());
}

#[tokio::test]
async fn test_router_sends_reads_to_replica() {
    let dir = TempDir::new().unwrap();
    let primary: Arc<dyn UrlStore> = Arc::new(sqlite_primary(&dir).await);
    let replica: Arc<dyn UrlStore> = Arc::new(sqlite_replica(&dir, "replica-0").await);
    let router = StoreRouter::with_replicas(
        primary,
        vec![replica],
        shortener::storage::selector_for(Default::default()),
    );

    router.writer().create_with_key("https://example.org", encode).await.unwrap();

    assert_eq!(router.writer().name(), "primary");
    assert_eq!(router.reader().name(), "replica-0");
    assert!(router.reader().find_by_key("1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_reconnect_keeps_data_and_reruns_migrations() {
    let dir = TempDir::new().unwrap();
    {
        let store = sqlite_primary(&dir).await;
        store.create_with_key("https://example.org", encode).await.unwrap();
    }

    let store = sqlite_primary(&dir).await;
    let next = store.create_with_key("https://example.org/2", encode).await.unwrap();

    assert_eq!(next.id, 2);
    assert!(store.find_by_key("1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_connect_rejects_unknown_scheme() {
    let result = shortener::storage::SeaOrmStore::connect(
        "mongodb://localhost/urls",
        StoreRole::Primary,
        "primary",
        Default::default(),
    )
    .await;
    assert!(result.is_err());
}
