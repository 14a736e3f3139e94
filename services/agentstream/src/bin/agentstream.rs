//! services/agentstream/src/bin/agentstream.rs

use agentstream_lib::{
    cli::{self, Cli},
    config::Config,
    error::AppError,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Parse Arguments, Load Configuration & Set Up Logging ---
    let args = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(data_path = %config.data_path.display(), "Configuration loaded");

    // --- 2. Run the Command ---
    cli::run(args, config).await
}
