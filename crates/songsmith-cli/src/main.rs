mod args;
mod commands;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // API keys usually live in a .env file next to the project
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.global.verbose {
        0 => "songsmith=info",
        1 => "songsmith=debug",
        2 => "songsmith=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match &cli.command {
        Commands::Song(args) => commands::song::run(args, &cli.global).await,
        Commands::Telegram(args) => commands::telegram::run(args, &cli.global).await,
        Commands::Transition(args) => commands::transition::run(args, &cli.global).await,
        Commands::Doctor => commands::doctor::run(&cli.global).await,
        Commands::Config => commands::config::run(&cli.global).await,
    }
}
