//! Example: Using Redis distributed locks
//!
//! Run with: `cargo run --example redis_lock`
//!
//! Requires a Redis server. Set REDIS_URL (comma-separated for several
//! independent servers) and optionally REDIS_PASSWORD.

use std::time::Duration;

use pz_lock::{LockProvider, LockProviderExt, RedisLockProviderBuilder};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,pz_lock_core=debug".into()))
        .init();

    println!("Connecting to Redis...");
    let provider = RedisLockProviderBuilder::from_env()
        .expiry(Duration::from_secs(10))
        .build()
        .await?;
    println!("Created Redis lock provider over {} server(s)", provider.nodes().len());

    // Create a lock by name
    let mut lock = provider.create_lock("example-resource")?;
    println!("Created lock: {} (quorum {})", lock.name(), lock.config().quorum());

    // Acquire the lock, retrying until the configured tries run out
    lock.acquire().await?;
    println!("Lock acquired, valid for another {:?}", lock.validity());

    // Do some work, pushing the expiry out half way through
    tokio::time::sleep(Duration::from_secs(3)).await;
    if lock.touch().await? {
        println!("Lock expiry reset on a quorum of servers");
    } else {
        println!("Lock was lost while working");
    }
    tokio::time::sleep(Duration::from_secs(3)).await;

    // Release the lock
    let released = lock.release().await?;
    println!("Lock released (quorum confirmed: {released})");

    // One-shot helper with a custom expiry
    let mut short = provider
        .acquire_lock("example-short", Some(Duration::from_secs(2)))
        .await?;
    println!("Short lock acquired with token {}", short.value());
    short.release().await?;

    Ok(())
}
