//! Core traits for distributed locks.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LockResult;
use crate::redlock::RedLock;

// ============================================================================
// Node Trait
// ============================================================================

/// A single key-value store endpoint taking part in the quorum.
///
/// Each operation must be atomic on the node itself. The lock manager only
/// ever touches a lock key through these three calls.
///
/// Errors returned here never surface to the caller of the lock: they are
/// logged and counted as a non-success for that node.
#[async_trait]
pub trait LockNode: Send + Sync + Debug {
    /// Label used in logs.
    fn id(&self) -> &str;

    /// Whether the node should be consulted at all.
    ///
    /// Unavailable nodes are skipped entirely: they are neither an attempt
    /// nor a failure, but they still count towards the quorum size.
    fn is_available(&self) -> bool {
        true
    }

    /// Sets `key` to `value` with a time-to-live of `ttl`, only if `key`
    /// does not exist yet (`SET key value NX PX ttl`).
    ///
    /// Returns `Ok(false)` when the key already existed.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool>;

    /// Deletes `key` if and only if it currently holds `value`.
    ///
    /// Returns `Ok(true)` when a key was deleted.
    async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool>;

    /// Resets the time-to-live of `key` to `ttl` if and only if it currently
    /// holds `value`.
    async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool>;
}

#[async_trait]
impl<T: LockNode + ?Sized> LockNode for Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool> {
        (**self).delete_if_match(key, value).await
    }

    async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        (**self).touch_if_match(key, value, ttl).await
    }
}

#[async_trait]
impl<T: LockNode + ?Sized> LockNode for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        (**self).set_if_absent(key, value, ttl).await
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool> {
        (**self).delete_if_match(key, value).await
    }

    async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        (**self).touch_if_match(key, value, ttl).await
    }
}

// ============================================================================
// Provider Traits
// ============================================================================

/// Factory for creating distributed locks by name.
///
/// Providers encapsulate the node set and the lock tuning, allowing
/// application code to be backend-agnostic.
///
/// # Example
///
/// ```rust,ignore
/// // Configure once at startup
/// let provider = RedisLockProvider::builder().url("redis://localhost").build().await?;
///
/// // Create locks by name anywhere in the application
/// let mut lock = provider.create_lock("my-resource")?;
/// lock.acquire().await?;
/// ```
pub trait LockProvider: Send + Sync {
    /// Creates an unheld lock with the given name.
    fn create_lock(&self, name: &str) -> LockResult<RedLock>;

    /// Creates an unheld lock with the given name and a custom expiry.
    fn create_lock_with_expiry(&self, name: &str, expiry: Duration) -> LockResult<RedLock>;
}

// ============================================================================
// Convenience Extensions
// ============================================================================

/// Extension trait providing convenience methods for lock providers.
pub trait LockProviderExt: LockProvider {
    /// Creates a lock by name and acquires it, returning the held lock.
    ///
    /// `expiry` overrides the provider's expiry for this lock only.
    fn acquire_lock(
        &self,
        name: &str,
        expiry: Option<Duration>,
    ) -> impl Future<Output = LockResult<RedLock>> + Send
    where
        Self: Sync,
    {
        async move {
            let mut lock = match expiry {
                Some(expiry) => self.create_lock_with_expiry(name, expiry)?,
                None => self.create_lock(name)?,
            };
            lock.acquire().await?;
            Ok(lock)
        }
    }
}

// Blanket implementation for all LockProviders
impl<T: LockProvider> LockProviderExt for T {}
