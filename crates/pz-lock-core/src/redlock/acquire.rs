//! RedLock acquire algorithm implementation.

use tokio::time::Instant;
use tracing::debug;

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};

use super::helper::RedLockHelper;
use super::timeouts::lock_deadline;
use super::{LockState, tally};

/// Acquires a lock using the RedLock algorithm across the configured nodes.
///
/// Each attempt writes the token to every available node with
/// `SET NX PX expiry`. The attempt succeeds when at least `quorum` nodes
/// accepted the write *and* the drift-adjusted deadline has not passed yet.
/// Partial acquisitions are left to expire on their own.
///
/// The token is drawn once and reused by every attempt, so keys left behind
/// by a failed attempt still belong to this lock.
///
/// On success `state` holds the token and the local deadline.
pub async fn acquire_redlock(config: &LockConfig, state: &mut LockState) -> LockResult<()> {
    acquire_with_token(config, state, RedLockHelper::create_lock_token).await
}

/// Acquire with an explicit token source, consulted only when the
/// configuration carries no caller-supplied value.
pub(crate) async fn acquire_with_token<G>(
    config: &LockConfig,
    state: &mut LockState,
    generate: G,
) -> LockResult<()>
where
    G: FnOnce() -> LockResult<String>,
{
    let tries = config.tries();
    let value = match config.value() {
        Some(value) => value.to_string(),
        None => generate()?,
    };

    for attempt in 1..=tries {
        let start = Instant::now();
        let acquired = tally(config, "set_if_absent", |node| {
            node.set_if_absent(config.name(), &value, config.expiry())
        })
        .await;
        let until = lock_deadline(config, start, start.elapsed());

        if acquired >= config.quorum()
            && let Some(until) = until
            && Instant::now() < until
        {
            debug!(attempt, acquired, quorum = config.quorum(), "lock acquired");
            state.hold(value, until);
            return Ok(());
        }

        debug!(
            attempt,
            tries,
            acquired,
            quorum = config.quorum(),
            expired = until.is_none(),
            "lock attempt failed"
        );

        if attempt < tries {
            tokio::time::sleep(config.delay()).await;
        }
    }

    Err(LockError::NotAcquired)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::memory::MemoryNode;
    use crate::traits::LockNode;

    /// Memory node that counts the writes it receives.
    #[derive(Debug)]
    struct CountingNode {
        inner: MemoryNode,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl LockNode for CountingNode {
        fn id(&self) -> &str {
            self.inner.id()
        }

        async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_if_absent(key, value, ttl).await
        }

        async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool> {
            self.inner.delete_if_match(key, value).await
        }

        async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
            self.inner.touch_if_match(key, value, ttl).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entropy_failure_aborts_before_any_node_call() {
        let node = Arc::new(CountingNode {
            inner: MemoryNode::new("n"),
            writes: AtomicUsize::new(0),
        });
        let config = LockConfig::builder("res")
            .tries(3)
            .delay(Duration::from_millis(10))
            .node(node.clone())
            .build()
            .unwrap();
        let mut state = LockState::default();
        let started = Instant::now();

        let err = acquire_with_token(&config, &mut state, || {
            Err(LockError::Entropy(rand::Error::new(std::io::Error::other(
                "no entropy",
            ))))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, LockError::Entropy(_)));
        assert_eq!(node.writes.load(Ordering::SeqCst), 0);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(!state.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn test_supplied_value_skips_token_source() {
        let node: Arc<dyn LockNode> = Arc::new(MemoryNode::new("n"));
        let config = LockConfig::builder("res")
            .value("fixed")
            .node(node)
            .build()
            .unwrap();
        let mut state = LockState::default();

        acquire_with_token(&config, &mut state, || unreachable!("value was supplied"))
            .await
            .unwrap();
        assert_eq!(state.value(), "fixed");
    }
}
