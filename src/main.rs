//! Wallet Flow Visualizer

use clap::Parser;
use wallet_flow_viz::{Config, Result, VERSION, cli, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level);

    tracing::info!("Wallet Flow Visualizer v{}", VERSION);

    cli::execute(args, config).await?;

    Ok(())
}
