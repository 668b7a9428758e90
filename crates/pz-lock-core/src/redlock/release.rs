//! RedLock release algorithm implementation.

use tracing::{debug, error};

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};

use super::{LockState, tally};

/// Deletes the lock key on every node that still stores our token.
///
/// The local state is cleared before the nodes are contacted: once release
/// has been attempted the caller must not assume ownership, even when fewer
/// than `quorum` nodes confirm the deletion.
pub async fn release_redlock(config: &LockConfig, state: &mut LockState) -> LockResult<bool> {
    if !state.is_held() {
        error!(lock.name = config.name(), "unlock of unlocked mutex");
        return Err(LockError::NotHeld("unlock"));
    }

    let value = state.take();
    let released = tally(config, "delete_if_match", |node| {
        node.delete_if_match(config.name(), &value)
    })
    .await;

    debug!(released, quorum = config.quorum(), "lock released");
    Ok(released >= config.quorum())
}
