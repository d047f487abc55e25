use clap::Parser;
use podscan::cli::{commands, Cli};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting podscan v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = commands::handle_command(cli.command, cli.config.as_deref()).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
