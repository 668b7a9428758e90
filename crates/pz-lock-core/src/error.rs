//! Error types for distributed lock operations.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// Invalid lock name.
    #[error("invalid lock name: {0}")]
    InvalidName(String),

    /// The lock configuration cannot be used (no nodes, bad drift factor, ...).
    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),

    /// The OS random source failed while generating a lock token.
    #[error("failed to generate lock token: {0}")]
    Entropy(#[source] rand::Error),

    /// Every acquisition attempt failed to reach quorum in time.
    #[error("failed to acquire lock")]
    NotAcquired,

    /// Touch or release was called on a lock that is not held.
    ///
    /// This is a programming error, not a transient condition.
    #[error("{0} of unlocked mutex")]
    NotHeld(&'static str),

    /// A single node call did not complete in time.
    #[error("node call timed out after {0:?}")]
    Timeout(Duration),

    /// Backend connection failed.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LockError {
    /// Returns `true` for errors caused by misuse of the API rather than by
    /// the environment.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            LockError::NotHeld(_) | LockError::InvalidName(_) | LockError::InvalidConfig(_)
        )
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
