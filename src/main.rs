use std::path::PathBuf;

use clap::Parser;

use catalog_connector::config::resolve_config;
use catalog_connector::lifecycle::startup;
use catalog_connector::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "catalog-connector", version, about = "Catalog backend with moderation and lead capture")]
struct Args {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long, env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        "catalog-connector starting"
    );

    startup::run(config).await?;
    Ok(())
}
