use clap::Parser;
use grounding::{config::Cli, logging::init_logging, server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.logging)?;

    info!(?config, "Starting grounding server");
    server::run(config).await
}
