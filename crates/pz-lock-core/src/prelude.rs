//! Convenience prelude for distributed lock types.

pub use crate::config::{LockConfig, LockConfigBuilder};
pub use crate::error::{LockError, LockResult};
pub use crate::memory::MemoryNode;
pub use crate::redlock::{LockState, RedLock};
pub use crate::traits::{LockNode, LockProvider, LockProviderExt};
