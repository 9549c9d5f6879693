//! liqflow - streaming liquidation/trade aggregation pipeline.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Streaming market-data aggregation pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LIQFLOW_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    liqflow_ws::init_crypto();

    let args = Args::parse();

    liqflow_app::init_logging();

    info!("Starting liqflow v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > LIQFLOW_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("LIQFLOW_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = liqflow_app::AppConfig::load(&config_path)?;
    info!(
        pairs = config.pairs.len(),
        interval_secs = config.aggregation_interval_secs,
        "Configuration loaded"
    );

    let app = liqflow_app::Application::new(config)?;
    app.run().await?;

    Ok(())
}
