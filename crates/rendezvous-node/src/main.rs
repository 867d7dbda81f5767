//! Rendezvous node entry point.

use anyhow::Result;
use rendezvous_node::config::{config_path, load_config};
use rendezvous_node::NodeRuntime;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&config_path())?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
