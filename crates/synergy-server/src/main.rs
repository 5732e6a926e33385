//! Synergy Node binary

use synergy_server::{ServerConfig, SynergyNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synergy_node=info,synergy_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Synergy Node");

    let config = ServerConfig::from_env()?;

    let node = SynergyNode::new(config).await?;
    node.run().await?;

    Ok(())
}
