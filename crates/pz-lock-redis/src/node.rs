//! Redis lock node.

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use pz_lock_core::error::{LockError, LockResult};
use pz_lock_core::traits::LockNode;

/// Lua script to release the lock.
const RELEASE_SCRIPT_LUA: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// Lua script to reset the lock expiry.
const TOUCH_SCRIPT_LUA: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("set", KEYS[1], ARGV[1], "xx", "px", ARGV[2])
else
    return "ERR"
end
"#;

/// A single Redis server taking part in the lock quorum.
#[derive(Debug, Clone)]
pub struct RedisNode {
    id: String,
    client: RedisClient,
}

impl RedisNode {
    /// Wraps a (connected or connecting) client.
    pub fn new(client: RedisClient) -> Self {
        Self {
            id: client.id().to_string(),
            client,
        }
    }

    /// Wraps a client under an explicit label, e.g. its URL.
    pub fn with_id(id: impl Into<String>, client: RedisClient) -> Self {
        Self {
            id: id.into(),
            client,
        }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    /// Remaining time-to-live of `key`, `None` if it does not exist or has
    /// no expiry.
    pub async fn pttl(&self, key: &str) -> LockResult<Option<Duration>> {
        let millis: i64 = self.client.pttl(key).await.map_err(backend_error)?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

fn backend_error(e: RedisError) -> LockError {
    LockError::Backend(Box::new(e))
}

#[async_trait]
impl LockNode for RedisNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_available(&self) -> bool {
        self.client.is_connected()
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        // SET NX returns Some("OK") if the key was set, None if it already exists
        let result: Option<String> = self
            .client
            .set(
                key,
                value,
                Some(Expiration::PX(ttl_millis(ttl))),
                Some(SetOptions::NX),
                false,
            )
            .await
            .map_err(backend_error)?;

        Ok(result.is_some())
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool> {
        let deleted: i64 = self
            .client
            .eval(RELEASE_SCRIPT_LUA, key, vec![value.to_string()])
            .await
            .map_err(backend_error)?;

        Ok(deleted != 0)
    }

    async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        let reply: Option<String> = self
            .client
            .eval(
                TOUCH_SCRIPT_LUA,
                key,
                vec![value.to_string(), ttl_millis(ttl).to_string()],
            )
            .await
            .map_err(backend_error)?;

        Ok(reply.as_deref() == Some("OK"))
    }
}
