//! RedLock helper functions.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{LockError, LockResult};

/// Number of random bytes behind a lock token.
pub const TOKEN_BYTES: usize = 16;

/// Helper functions for RedLock algorithm.
pub struct RedLockHelper;

impl RedLockHelper {
    /// Minimum number of agreeing nodes for `database_count` nodes.
    pub fn quorum(database_count: usize) -> usize {
        (database_count / 2) + 1
    }

    /// Generates an unpredictable lock token.
    ///
    /// 16 bytes from the OS random source, base64 encoded. The token is what
    /// distinguishes the genuine holder on release, so it must never come
    /// from a seeded PRNG.
    pub fn create_lock_token() -> LockResult<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(LockError::Entropy)?;
        Ok(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_arithmetic() {
        let expected = [(1, 1), (2, 2), (3, 2), (4, 3), (5, 3)];
        for (nodes, quorum) in expected {
            assert_eq!(RedLockHelper::quorum(nodes), quorum, "nodes = {nodes}");
        }
    }

    #[test]
    fn test_lock_token_shape() {
        let a = RedLockHelper::create_lock_token().unwrap();
        let b = RedLockHelper::create_lock_token().unwrap();
        // 16 bytes -> 24 base64 characters with padding
        assert_eq!(a.len(), 24);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), TOKEN_BYTES);
        assert_ne!(a, b);
    }
}
