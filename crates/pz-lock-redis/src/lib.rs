//! Redis backend for distributed locks.

pub mod node;
pub mod provider;

pub use node::RedisNode;
pub use provider::{RedisLockProvider, RedisLockProviderBuilder};
