//! Core types and the redlock quorum algorithm.

pub mod config;
pub mod error;
pub mod memory;
pub mod prelude;
pub mod redlock;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;
