//! Redlock-style distributed mutual exclusion for Rust.
//!
//! A lock is a key written to a set of independent key-value nodes. It is
//! held when a majority (`nodes / 2 + 1`) accepted the write and the
//! drift-adjusted validity window has not elapsed yet.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pz_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to one or more independent Redis servers
//!     let provider = RedisLockProvider::builder()
//!         .url("redis://localhost:6379")
//!         .expiry(Duration::from_secs(10))
//!         .build()
//!         .await?;
//!
//!     // Create a lock by name and acquire it
//!     let mut lock = provider.create_lock("my-resource")?;
//!     lock.acquire().await?;
//!
//!     // Critical section - finish before `lock.validity()` runs out,
//!     // or push the node-side expiry with `touch`
//!     lock.touch().await?;
//!
//!     lock.release().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Nodes
//!
//! Any type implementing [`LockNode`] can take part in the quorum.
//! [`RedisNode`] talks to a Redis server; [`MemoryNode`] keeps the keys
//! in-process and is handy in tests.
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `pz-lock-core`: lock configuration, the quorum algorithm and core traits
//! - `pz-lock-redis`: Redis backend
//!
//! For fine-grained control, you can depend on individual crates instead.

// Re-export core types and traits
pub use pz_lock_core::*;

// Re-export redis backend
pub use pz_lock_redis::*;
