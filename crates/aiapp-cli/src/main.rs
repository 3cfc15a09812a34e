mod chat;
mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .init();

    let config = config::CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Apps => chat::list_apps(&config),
        Commands::Ask(args) => chat::ask(&config, args).await,
        Commands::Chat(args) => chat::chat(&config, args).await,
    }
}
