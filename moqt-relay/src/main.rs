use anyhow::Result;
use moqt_relay::{init_logging, RelayConfig, RelayInstance};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RelayConfig::new();
    init_logging(config.log_level.clone());

    let relay = RelayInstance::new(config);
    tracing::info!("relay engine started");

    tokio::signal::ctrl_c().await?;

    relay.shutdown();
    tracing::info!("relay engine stopped");

    Ok(())
}
