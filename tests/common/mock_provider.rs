//! In-memory provider for testing the provider abstraction.

use std::sync::Arc;
use std::time::Duration;

use pz_lock::{LockConfig, LockNode, LockProvider, LockResult, MemoryNode, RedLock};

/// Provider handing out locks over a fixed set of in-memory nodes.
pub struct MemoryLockProvider {
    nodes: Vec<Arc<MemoryNode>>,
    expiry: Duration,
}

impl MemoryLockProvider {
    /// Creates a provider over `count` fresh nodes.
    pub fn new(count: usize) -> Self {
        Self {
            nodes: (0..count)
                .map(|i| Arc::new(MemoryNode::new(format!("mem-{i}"))))
                .collect(),
            expiry: Duration::ZERO,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn node(&self, index: usize) -> &MemoryNode {
        &self.nodes[index]
    }

    fn config(&self, name: &str, expiry: Duration) -> LockResult<LockConfig> {
        LockConfig::builder(name)
            .expiry(expiry)
            .tries(2)
            .delay(Duration::from_millis(10))
            .nodes(self.nodes.iter().map(|n| n.clone() as Arc<dyn LockNode>))
            .build()
    }
}

impl Default for MemoryLockProvider {
    fn default() -> Self {
        Self::new(3)
    }
}

impl LockProvider for MemoryLockProvider {
    fn create_lock(&self, name: &str) -> LockResult<RedLock> {
        self.config(name, self.expiry).map(RedLock::new)
    }

    fn create_lock_with_expiry(&self, name: &str, expiry: Duration) -> LockResult<RedLock> {
        self.config(name, expiry).map(RedLock::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider_creates_locks() {
        let provider = MemoryLockProvider::default();
        let lock = provider.create_lock("test-lock").unwrap();
        assert_eq!(lock.name(), "test-lock");
        assert_eq!(lock.config().quorum(), 2);
        assert!(!lock.is_held());
    }

    #[test]
    fn test_memory_provider_rejects_empty_name() {
        let provider = MemoryLockProvider::default();
        assert!(provider.create_lock("").is_err());
    }
}
