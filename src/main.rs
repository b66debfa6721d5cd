use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_proxy::config::{load_config, load_default_config};
use api_proxy::lifecycle;
use api_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "api-proxy")]
#[command(about = "Translates kraken v3 API requests to v5", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path),
        None => load_default_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("api-proxy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-proxy starting");

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "api-proxy failed");
            ExitCode::FAILURE
        }
    }
}
