//! linesmart: AI provider orchestration for LineSmart training content.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use linesmart_core::{ConfigStore, Orchestrator, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON only.
    let filter = if cli.verbose {
        EnvFilter::new("linesmart=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_store = ConfigStore::new();
    if let Commands::Config { action } = &cli.command {
        return commands::config::run(&config_store, action);
    }

    config_store.hydrate_env();
    let config = config_store.load();
    let settings = Settings::from_env(&config)?;
    let orchestrator = Orchestrator::from_settings(&settings)?;

    commands::run(cli, &orchestrator).await
}
