//! Main entry point for the sample-uploader CLI

use clap::Parser;
use sample_uploader::cli::{exit_code, Cli, EXIT_FATAL};
use sample_uploader::shutdown::{self, ShutdownCoordinator};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
///
/// Logs go to stderr so stdout carries only the run report.
fn init_tracing() {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sample_uploader=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    // Ctrl+C stops new files from starting; in-flight uploads finish
    let shutdown = ShutdownCoordinator::shared();
    shutdown::install_ctrl_c_handler(shutdown.clone());

    let code = match cli.execute(shutdown).await {
        Ok(summary) => exit_code(&summary),
        Err(e) => {
            error!("Upload failed: {:#}", anyhow::anyhow!(e));
            EXIT_FATAL
        }
    };

    std::process::exit(code);
}
