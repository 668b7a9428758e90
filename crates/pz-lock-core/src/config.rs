//! Lock configuration.
//!
//! A [`LockConfig`] names the protected resource, carries the retry and
//! drift tuning, and owns the set of nodes that must be consulted. It is
//! immutable once built.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LockError, LockResult};
use crate::redlock::helper::RedLockHelper;
use crate::traits::LockNode;

/// Lock validity used when no expiry (or a zero expiry) is configured.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(8);

/// Acquisition attempts used when no try count (or zero) is configured.
pub const DEFAULT_TRIES: u32 = 16;

/// Wait between failed attempts when no delay (or zero) is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(512);

/// Fraction of the expiry reserved for clock drift when unset.
pub const DEFAULT_DRIFT_FACTOR: f64 = 0.01;

/// Fixed margin subtracted from every computed deadline for residual skew.
pub const CLOCK_DRIFT_MARGIN: Duration = Duration::from_millis(2);

/// Upper bound for a single node call. Always capped at the expiry.
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(1);

/// Immutable description of a lock over a set of nodes.
#[derive(Clone)]
pub struct LockConfig {
    name: String,
    expiry: Duration,
    tries: u32,
    delay: Duration,
    drift_factor: f64,
    node_timeout: Duration,
    quorum: usize,
    value: Option<String>,
    nodes: Vec<Arc<dyn LockNode>>,
}

impl LockConfig {
    /// Returns a builder for a lock on the resource `name`.
    pub fn builder(name: impl Into<String>) -> LockConfigBuilder {
        LockConfigBuilder::new(name)
    }

    /// The resource name, used verbatim as the key on every node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How long the lock stays valid on each node.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Maximum number of acquisition attempts.
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Wait between two failed acquisition attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Fraction of the expiry reserved for clock drift.
    pub fn drift_factor(&self) -> f64 {
        self.drift_factor
    }

    /// Effective per-node call deadline.
    pub fn node_timeout(&self) -> Duration {
        self.node_timeout.min(self.expiry)
    }

    /// Minimum number of nodes that must agree: `nodes / 2 + 1`.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Token supplied by the caller, reused by every acquisition.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Every node the lock is spread over, including unavailable ones.
    pub fn nodes(&self) -> &[Arc<dyn LockNode>] {
        &self.nodes
    }

    /// Time reserved for clock drift: `expiry * drift_factor`.
    pub fn drift(&self) -> Duration {
        self.expiry.mul_f64(self.drift_factor)
    }
}

impl fmt::Debug for LockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockConfig")
            .field("name", &self.name)
            .field("expiry", &self.expiry)
            .field("tries", &self.tries)
            .field("delay", &self.delay)
            .field("drift_factor", &self.drift_factor)
            .field("node_timeout", &self.node_timeout)
            .field("quorum", &self.quorum)
            .field("nodes", &self.nodes.iter().map(|n| n.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`LockConfig`].
///
/// Zero values are indistinguishable from unset ones and resolve to the
/// documented defaults.
pub struct LockConfigBuilder {
    name: String,
    expiry: Duration,
    tries: u32,
    delay: Duration,
    drift_factor: f64,
    node_timeout: Duration,
    value: Option<String>,
    nodes: Vec<Arc<dyn LockNode>>,
}

impl LockConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiry: Duration::ZERO,
            tries: 0,
            delay: Duration::ZERO,
            drift_factor: 0.0,
            node_timeout: Duration::ZERO,
            value: None,
            nodes: vec![],
        }
    }

    /// Sets the lock expiry time.
    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Sets the number of acquisition attempts.
    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Sets the delay between acquisition attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the drift factor. Must be in `[0, 1)`.
    pub fn drift_factor(mut self, drift_factor: f64) -> Self {
        self.drift_factor = drift_factor;
        self
    }

    /// Sets the deadline for a single node call.
    pub fn node_timeout(mut self, node_timeout: Duration) -> Self {
        self.node_timeout = node_timeout;
        self
    }

    /// Uses a fixed token instead of a fresh random one per acquisition.
    ///
    /// An empty value is treated as unset.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.value = (!value.is_empty()).then_some(value);
        self
    }

    /// Adds a node.
    pub fn node(mut self, node: Arc<dyn LockNode>) -> Self {
        self.nodes.push(node);
        self
    }

    /// Adds multiple nodes, keeping their order.
    pub fn nodes(mut self, nodes: impl IntoIterator<Item = Arc<dyn LockNode>>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Validates the settings and resolves defaults.
    pub fn build(self) -> LockResult<LockConfig> {
        if self.name.is_empty() {
            return Err(LockError::InvalidName("name is empty".to_string()));
        }
        if self.nodes.is_empty() {
            return Err(LockError::InvalidConfig("nodes is empty".to_string()));
        }
        if !self.drift_factor.is_finite() || !(0.0..1.0).contains(&self.drift_factor) {
            return Err(LockError::InvalidConfig(format!(
                "drift factor must be in [0, 1), got {}",
                self.drift_factor
            )));
        }

        let or_default = |d: Duration, default: Duration| if d.is_zero() { default } else { d };

        Ok(LockConfig {
            quorum: RedLockHelper::quorum(self.nodes.len()),
            name: self.name,
            expiry: or_default(self.expiry, DEFAULT_EXPIRY),
            tries: if self.tries == 0 { DEFAULT_TRIES } else { self.tries },
            delay: or_default(self.delay, DEFAULT_DELAY),
            drift_factor: if self.drift_factor == 0.0 {
                DEFAULT_DRIFT_FACTOR
            } else {
                self.drift_factor
            },
            node_timeout: or_default(self.node_timeout, DEFAULT_NODE_TIMEOUT),
            value: self.value,
            nodes: self.nodes,
        })
    }
}
