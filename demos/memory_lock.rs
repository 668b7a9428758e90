//! Example: Redlock quorum over in-process nodes
//!
//! Run with: `cargo run --example memory_lock`
//!
//! Shows how the quorum reacts when nodes go away.

use std::sync::Arc;
use std::time::Duration;

use pz_lock::{LockConfig, LockNode, MemoryNode, RedLock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let nodes: Vec<Arc<MemoryNode>> = (0..5)
        .map(|i| Arc::new(MemoryNode::new(format!("node-{i}"))))
        .collect();

    let config = LockConfig::builder("inventory")
        .expiry(Duration::from_secs(2))
        .tries(3)
        .delay(Duration::from_millis(100))
        .nodes(nodes.iter().map(|n| n.clone() as Arc<dyn LockNode>))
        .build()?;
    println!("{} nodes, quorum {}", config.nodes().len(), config.quorum());

    let mut lock = RedLock::new(config);
    lock.acquire().await?;
    println!("acquired with all nodes up, validity {:?}", lock.validity());
    lock.release().await?;

    // Two nodes down: 3 of 5 still form a quorum
    nodes[0].set_available(false);
    nodes[1].set_available(false);
    lock.acquire().await?;
    println!("acquired with two nodes down");
    lock.release().await?;

    // Three nodes down: no quorum possible
    nodes[2].set_available(false);
    match lock.acquire().await {
        Ok(()) => println!("unexpectedly acquired"),
        Err(e) => println!("three nodes down: {e}"),
    }

    Ok(())
}
