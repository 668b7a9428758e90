//! RedLock algorithm implementation for distributed locking across multiple
//! key-value nodes.
//!
//! See https://redis.io/topics/distlock for the algorithm specification.

pub mod acquire;
pub mod helper;
pub mod release;
pub mod timeouts;
pub mod touch;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{instrument, trace, warn};

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};
use crate::traits::LockNode;

pub use helper::RedLockHelper;

/// Mutable part of a lock: the token and the local validity estimate.
///
/// `value` is non-empty exactly while the lock is believed held. `until` is
/// advisory; only the per-node TTL actually enforces expiry.
#[derive(Debug, Clone, Default)]
pub struct LockState {
    value: String,
    until: Option<Instant>,
}

impl LockState {
    /// Token of the current holder, empty when unlocked.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Local validity deadline. `None` when unlocked.
    pub fn until(&self) -> Option<Instant> {
        self.until
    }

    pub fn is_held(&self) -> bool {
        !self.value.is_empty()
    }

    pub(crate) fn hold(&mut self, value: String, until: Instant) {
        self.value = value;
        self.until = Some(until);
    }

    /// Clears the state and hands back the token that was held.
    pub(crate) fn take(&mut self) -> String {
        self.until = None;
        std::mem::take(&mut self.value)
    }
}

/// A named lock over a quorum of nodes.
///
/// Operations take `&mut self` where they change the state, so one
/// instance can never run two acquisitions at once. Separate instances for
/// the same name contend through the nodes only.
///
/// # Example
///
/// ```rust,ignore
/// let config = LockConfig::builder("orders:42").node(node).build()?;
/// let mut lock = RedLock::new(config);
/// lock.acquire().await?;
/// // critical section
/// lock.release().await?;
/// ```
#[derive(Debug)]
pub struct RedLock {
    config: LockConfig,
    state: LockState,
}

impl RedLock {
    /// Creates an unheld lock.
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            state: LockState::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn state(&self) -> &LockState {
        &self.state
    }

    /// Token of the current holder, empty when unlocked.
    pub fn value(&self) -> &str {
        self.state.value()
    }

    pub fn until(&self) -> Option<Instant> {
        self.state.until()
    }

    pub fn is_held(&self) -> bool {
        self.state.is_held()
    }

    /// Time left before the local deadline. Zero when unheld or elapsed.
    pub fn validity(&self) -> Duration {
        self.state
            .until()
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or_default()
    }

    /// Acquires the lock on a quorum of nodes, retrying up to `tries` times.
    ///
    /// # Errors
    ///
    /// * `LockError::NotAcquired` - no attempt reached quorum in time
    /// * `LockError::Entropy` - the token could not be generated
    #[instrument(skip(self), fields(lock.name = %self.config.name(), servers = self.config.nodes().len()))]
    pub async fn acquire(&mut self) -> LockResult<()> {
        acquire::acquire_redlock(&self.config, &mut self.state).await
    }

    /// Resets the node-side expiry of a held lock.
    ///
    /// Returns whether a quorum of nodes still held our token. The local
    /// `until` estimate is left unchanged.
    ///
    /// # Errors
    ///
    /// * `LockError::NotHeld` - the lock is not held; this is a caller bug
    #[instrument(skip(self), fields(lock.name = %self.config.name(), servers = self.config.nodes().len()))]
    pub async fn touch(&self) -> LockResult<bool> {
        touch::touch_redlock(&self.config, &self.state).await
    }

    /// Releases the lock, returning whether a quorum of nodes deleted it.
    ///
    /// Local state is cleared whatever the outcome.
    ///
    /// # Errors
    ///
    /// * `LockError::NotHeld` - the lock is not held; this is a caller bug
    #[instrument(skip(self), fields(lock.name = %self.config.name(), servers = self.config.nodes().len()))]
    pub async fn release(&mut self) -> LockResult<bool> {
        release::release_redlock(&self.config, &mut self.state).await
    }
}

/// Runs `call` against every available node concurrently and counts the
/// nodes that reported success.
///
/// Errors and timeouts are logged and count as a non-success.
pub(crate) async fn tally<'n, F, Fut>(config: &'n LockConfig, operation: &'static str, call: F) -> usize
where
    F: Fn(&'n Arc<dyn LockNode>) -> Fut,
    Fut: Future<Output = LockResult<bool>>,
{
    let node_timeout = config.node_timeout();

    let calls = config
        .nodes()
        .iter()
        .filter(|node| node.is_available())
        .map(|node| {
            let fut = call(node);
            async move {
                match tokio::time::timeout(node_timeout, fut).await {
                    Ok(Ok(success)) => {
                        trace!(node = node.id(), operation, success, "node replied");
                        success
                    }
                    Ok(Err(e)) => {
                        warn!(node = node.id(), operation, error = %e, "node call failed");
                        false
                    }
                    Err(_) => {
                        let e = LockError::Timeout(node_timeout);
                        warn!(node = node.id(), operation, error = %e, "node call failed");
                        false
                    }
                }
            }
        });

    join_all(calls).await.into_iter().filter(|&success| success).count()
}
