//! In-process lock node.
//!
//! Behaves like a single Redis instance for the three lock operations:
//! keys carry a time-to-live and vanish once it elapses. Time is read from
//! `tokio::time`, so tests running on a paused clock see deterministic
//! expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::LockResult;
use crate::traits::LockNode;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// A [`LockNode`] backed by a process-local map.
#[derive(Debug)]
pub struct MemoryNode {
    id: String,
    available: AtomicBool,
    latency: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryNode {
    /// Creates an empty, available node.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            available: AtomicBool::new(true),
            latency: Duration::ZERO,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Delays every operation by `latency`, simulating a slow round-trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Marks the node as (un)available.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current value of `key`, if it has not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        Self::live(&mut entries, key).map(|e| e.value.clone())
    }

    /// Remaining time-to-live of `key` (`PTTL`), if it has not expired.
    pub fn pttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.entries();
        Self::live(&mut entries, key).map(|e| e.expires_at.saturating_duration_since(Instant::now()))
    }

    /// Unconditionally stores `key`, e.g. to stand in for a rival holder.
    pub fn insert(&self, key: &str, value: &str, ttl: Duration) {
        self.entries().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops `key` if expired and returns the live entry otherwise.
    fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|e| e.expires_at <= Instant::now()) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl LockNode for MemoryNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.round_trip().await;
        let mut entries = self.entries();
        if Self::live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn delete_if_match(&self, key: &str, value: &str) -> LockResult<bool> {
        self.round_trip().await;
        let mut entries = self.entries();
        let owned = Self::live(&mut entries, key).is_some_and(|e| e.value == value);
        if owned {
            entries.remove(key);
        }
        Ok(owned)
    }

    async fn touch_if_match(&self, key: &str, value: &str, ttl: Duration) -> LockResult<bool> {
        self.round_trip().await;
        let mut entries = self.entries();
        match Self::live(&mut entries, key) {
            Some(entry) if entry.value == value => {
                entry.expires_at = Instant::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
