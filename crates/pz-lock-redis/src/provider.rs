//! Redis lock provider implementation.

use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use pz_lock_core::config::LockConfig;
use pz_lock_core::error::{LockError, LockResult};
use pz_lock_core::redlock::RedLock;
use pz_lock_core::traits::{LockNode, LockProvider};
use tracing::{debug, info};

use crate::node::RedisNode;

/// Environment variable holding one or more comma-separated Redis URLs.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Environment variable holding the Redis password, if any.
pub const REDIS_PASSWORD_ENV: &str = "REDIS_PASSWORD";

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Builder for Redis lock provider configuration.
///
/// Durations and counts left at zero fall back to the lock defaults
/// (8s expiry, 16 tries, 512ms delay, 0.01 drift factor).
pub struct RedisLockProviderBuilder {
    urls: Vec<String>,
    clients: Vec<RedisClient>,
    password: Option<String>,
    expiry: Duration,
    tries: u32,
    delay: Duration,
    drift_factor: f64,
    node_timeout: Duration,
}

impl RedisLockProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            urls: vec![],
            clients: vec![],
            password: None,
            expiry: Duration::ZERO,
            tries: 0,
            delay: Duration::ZERO,
            drift_factor: 0.0,
            node_timeout: Duration::ZERO,
        }
    }

    /// Creates a builder from `REDIS_URL` and `REDIS_PASSWORD`.
    ///
    /// `REDIS_URL` may list several servers separated by commas; it defaults
    /// to `redis://localhost:6379`.
    pub fn from_env() -> Self {
        let urls = std::env::var(REDIS_URL_ENV).unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let builder = Self::new().urls(&parse_urls(&urls));
        match std::env::var(REDIS_PASSWORD_ENV) {
            Ok(password) if !password.is_empty() => builder.password(password),
            _ => builder,
        }
    }

    /// Adds a Redis server URL.
    ///
    /// For RedLock, add multiple URLs (ideally 3 or 5).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }

    /// Adds multiple Redis server URLs.
    pub fn urls(mut self, urls: &[impl AsRef<str>]) -> Self {
        for url in urls {
            self.urls.push(url.as_ref().to_string());
        }
        self
    }

    /// Uses an existing Redis client.
    pub fn client(mut self, client: RedisClient) -> Self {
        self.clients.push(client);
        self
    }

    /// Password applied to every server added by URL.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
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

    /// Sets the clock drift factor.
    pub fn drift_factor(mut self, drift_factor: f64) -> Self {
        self.drift_factor = drift_factor;
        self
    }

    /// Sets the deadline for a single Redis round-trip.
    pub fn node_timeout(mut self, node_timeout: Duration) -> Self {
        self.node_timeout = node_timeout;
        self
    }

    /// Connects to every configured server and builds the provider.
    pub async fn build(self) -> LockResult<RedisLockProvider> {
        let mut nodes: Vec<Arc<dyn LockNode>> = self
            .clients
            .into_iter()
            .map(|client| Arc::new(RedisNode::new(client)) as Arc<dyn LockNode>)
            .collect();

        // Create clients from URLs if provided
        for url in self.urls {
            let mut config = RedisConfig::from_url(&url).map_err(|e| {
                LockError::Connection(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid Redis URL: {}", e),
                )))
            })?;
            if config.password.is_none() {
                config.password = self.password.clone();
            }

            let client = RedisClient::new(config, None, None, None);
            client.connect();
            client.wait_for_connect().await.map_err(|e| {
                LockError::Connection(Box::new(std::io::Error::other(format!(
                    "failed to connect to Redis at {}: {}",
                    redact(&url),
                    e
                ))))
            })?;
            debug!(server = %redact(&url), "connected to Redis");

            nodes.push(Arc::new(RedisNode::with_id(redact(&url), client)));
        }

        if nodes.is_empty() {
            return Err(LockError::InvalidConfig(
                "no Redis clients or URLs provided".to_string(),
            ));
        }

        info!(servers = nodes.len(), "redis lock provider ready");

        Ok(RedisLockProvider {
            nodes,
            expiry: self.expiry,
            tries: self.tries,
            delay: self.delay,
            drift_factor: self.drift_factor,
            node_timeout: self.node_timeout,
        })
    }
}

impl Default for RedisLockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider for Redis-based distributed locks.
///
/// Supports single-server and multi-server (RedLock) configurations.
pub struct RedisLockProvider {
    /// One node per Redis server.
    nodes: Vec<Arc<dyn LockNode>>,
    expiry: Duration,
    tries: u32,
    delay: Duration,
    drift_factor: f64,
    node_timeout: Duration,
}

impl RedisLockProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> RedisLockProviderBuilder {
        RedisLockProviderBuilder::new()
    }

    /// Creates a provider using the specified Redis URL.
    pub async fn new(url: impl Into<String>) -> LockResult<Self> {
        Self::builder().url(url).build().await
    }

    /// The nodes every lock from this provider is spread over.
    pub fn nodes(&self) -> &[Arc<dyn LockNode>] {
        &self.nodes
    }

    fn config(&self, name: &str, expiry: Duration) -> LockResult<LockConfig> {
        LockConfig::builder(name)
            .expiry(expiry)
            .tries(self.tries)
            .delay(self.delay)
            .drift_factor(self.drift_factor)
            .node_timeout(self.node_timeout)
            .nodes(self.nodes.iter().cloned())
            .build()
    }
}

impl LockProvider for RedisLockProvider {
    fn create_lock(&self, name: &str) -> LockResult<RedLock> {
        self.config(name, self.expiry).map(RedLock::new)
    }

    fn create_lock_with_expiry(&self, name: &str, expiry: Duration) -> LockResult<RedLock> {
        self.config(name, expiry).map(RedLock::new)
    }
}

/// Splits a comma-separated URL list, dropping blanks.
fn parse_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Hides the credentials of a URL for logging.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}***{}", &url[..scheme + 3], &url[at..]),
        _ => url.to_string(),
    }
}
