//! RedLock deadline calculations.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{CLOCK_DRIFT_MARGIN, LockConfig};

/// Computes the local validity deadline of an attempt that started at
/// `start` and spent `elapsed` talking to the nodes.
///
/// `until = start + expiry - elapsed - expiry * drift_factor - margin`
///
/// Returns `None` when the remaining validity is not positive.
pub fn lock_deadline(config: &LockConfig, start: Instant, elapsed: Duration) -> Option<Instant> {
    let validity = config
        .expiry()
        .checked_sub(elapsed)?
        .checked_sub(config.drift())?
        .checked_sub(CLOCK_DRIFT_MARGIN)?;
    if validity.is_zero() {
        return None;
    }
    Some(start + validity)
}
