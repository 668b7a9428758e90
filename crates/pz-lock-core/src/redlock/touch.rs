//! RedLock touch algorithm implementation.

use tracing::{debug, error};

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};

use super::{LockState, tally};

/// Resets the expiry of a held lock on every node that still stores our
/// token. Succeeds when a quorum of nodes did so.
///
/// The local `until` estimate is not recomputed here.
pub async fn touch_redlock(config: &LockConfig, state: &LockState) -> LockResult<bool> {
    if !state.is_held() {
        error!(lock.name = config.name(), "touch of unlocked mutex");
        return Err(LockError::NotHeld("touch"));
    }

    let touched = tally(config, "touch_if_match", |node| {
        node.touch_if_match(config.name(), state.value(), config.expiry())
    })
    .await;

    debug!(touched, quorum = config.quorum(), "lock touched");
    Ok(touched >= config.quorum())
}
