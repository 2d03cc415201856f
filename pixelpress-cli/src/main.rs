//! Pixelpress CLI - runs the compression service.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pixelpress::app::App;
use pixelpress::config::AppConfig;

/// Multi-tier image compression service over HTTP.
#[derive(Parser, Debug)]
#[command(name = "pixelpress", version, about)]
struct Args {
    /// Address to bind the HTTP server to (overrides ADDR).
    #[arg(long)]
    addr: Option<String>,

    /// Directory for produced archives (overrides OUTPUT_PATH).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(addr) = args.addr {
        config = config.with_addr(addr);
    }
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }

    if let Err(err) = App::new(config).run().await {
        tracing::error!(error = %err, "pixelpress failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
