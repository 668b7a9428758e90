//! Integration tests for Redis-based distributed locks.

use std::time::Duration;

use fred::prelude::*;
use pz_lock::{LockError, LockNode, LockProvider, LockProviderExt, RedisLockProvider, RedisNode};

/// Helper to get Redis URL from environment or use default.
fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

/// Lock names are shared server-side; keep them apart between runs.
fn unique_name(prefix: &str) -> String {
    format!("pz-lock-test:{}:{}", prefix, std::process::id())
}

/// A separate connection for looking at keys behind the lock's back.
async fn inspector() -> RedisNode {
    let config = RedisConfig::from_url(&get_redis_url()).unwrap();
    let client = RedisClient::new(config, None, None, None);
    client.connect();
    client.wait_for_connect().await.unwrap();
    RedisNode::new(client)
}

async fn fast_provider() -> RedisLockProvider {
    RedisLockProvider::builder()
        .url(get_redis_url())
        .tries(3)
        .delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_exclusive_lock_acquisition() {
    let provider = fast_provider().await;
    let name = unique_name("exclusive");

    // First acquisition should succeed
    let mut lock1 = provider.create_lock(&name).unwrap();
    lock1.acquire().await.unwrap();

    // Second acquisition should fail (lock is held)
    let mut lock2 = provider.create_lock(&name).unwrap();
    let err = lock2.acquire().await.unwrap_err();
    assert!(matches!(err, LockError::NotAcquired));

    // Release the lock
    assert!(lock1.release().await.unwrap());

    // Now acquisition should succeed
    lock2.acquire().await.unwrap();
    assert!(lock2.release().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_concurrent_acquire_single_winner() {
    let url = get_redis_url();
    let name = unique_name("contention");

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let url = url.clone();
        let name = name.clone();
        tasks.push(tokio::spawn(async move {
            let provider = RedisLockProvider::builder()
                .url(url)
                .tries(1)
                .build()
                .await
                .unwrap();
            let mut lock = provider.create_lock(&name).unwrap();
            lock.acquire().await.ok().map(|_| lock)
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        if let Some(lock) = task.await.unwrap() {
            winners.push(lock);
        }
    }
    assert_eq!(winners.len(), 1);
    winners[0].release().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_touch_resets_ttl() {
    let provider = fast_provider().await;
    let inspector = inspector().await;
    let name = unique_name("touch");
    let expiry = Duration::from_secs(4);

    let mut lock = provider.acquire_lock(&name, Some(expiry)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let before = inspector.pttl(&name).await.unwrap().unwrap();
    assert!(before <= Duration::from_millis(2600), "{before:?}");

    assert!(lock.touch().await.unwrap());
    let after = inspector.pttl(&name).await.unwrap().unwrap();
    assert!(after > Duration::from_millis(3500) && after <= expiry, "{after:?}");

    assert!(lock.release().await.unwrap());
    assert!(inspector.pttl(&name).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_touch_after_takeover_fails() {
    let provider = fast_provider().await;
    let inspector = inspector().await;
    let name = unique_name("takeover");

    let mut lock = provider.acquire_lock(&name, None).await.unwrap();

    // Someone else deletes and re-creates the key
    assert!(inspector.delete_if_match(&name, lock.value()).await.unwrap());
    assert!(
        inspector
            .set_if_absent(&name, "rival", Duration::from_secs(5))
            .await
            .unwrap()
    );

    assert!(!lock.touch().await.unwrap());
    assert!(!lock.release().await.unwrap());
    assert!(!lock.is_held());
    assert!(inspector.delete_if_match(&name, "rival").await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_lock_expiry() {
    let provider = RedisLockProvider::builder()
        .url(get_redis_url())
        .expiry(Duration::from_millis(200))
        .tries(1)
        .build()
        .await
        .unwrap();
    let name = unique_name("expiry");

    // Acquire lock and abandon it
    let mut stale = provider.create_lock(&name).unwrap();
    stale.acquire().await.unwrap();

    // Wait for lock to expire (longer than expiry time)
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(stale.validity(), Duration::ZERO);

    // Lock should have expired, so we can acquire it
    let mut fresh = provider.create_lock(&name).unwrap();
    fresh.acquire().await.unwrap();

    // The stale holder cannot delete the new holder's key
    assert!(!stale.release().await.unwrap());
    assert!(fresh.release().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis server running
async fn test_redlock_over_independent_databases() {
    // Separate logical databases behave as independent nodes.
    let base = get_redis_url();
    let base = base.trim_end_matches('/');
    let provider = RedisLockProvider::builder()
        .urls(&[format!("{base}/1"), format!("{base}/2"), format!("{base}/3")])
        .tries(2)
        .delay(Duration::from_millis(10))
        .build()
        .await
        .unwrap();
    assert_eq!(provider.nodes().len(), 3);
    let name = unique_name("redlock");

    let mut lock = provider.create_lock(&name).unwrap();
    assert_eq!(lock.config().quorum(), 2);
    lock.acquire().await.unwrap();

    let mut rival = provider.create_lock(&name).unwrap();
    assert!(rival.acquire().await.is_err());

    assert!(lock.touch().await.unwrap());
    assert!(lock.release().await.unwrap());
    rival.acquire().await.unwrap();
    rival.release().await.unwrap();
}
