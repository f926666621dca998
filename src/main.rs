use clap::Parser;
use poly_guard::cli::{Cli, Context};
use poly_guard::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e @ ConfigError::Read { .. }) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    // Initialize telemetry
    poly_guard::telemetry::init_telemetry(&config.telemetry)?;

    tracing::debug!(command = ?cli.command, "Running command");

    let ctx = Context::new(config, cli.json);
    cli.command.execute(&ctx).await
}
