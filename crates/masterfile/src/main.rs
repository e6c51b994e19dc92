use anyhow::Result;
use clap::Parser;

use masterfile::cli::{Cli, Commands};
use masterfile::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_options(&cli.options)?;

    dispatch(cli.command, &settings).await
}

async fn dispatch(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Ingest {
            chain,
            file,
            skip_stale,
            dry_run,
        } => masterfile::cli::ingest::run(settings, chain, &file, skip_stale, dry_run).await,
        Commands::RefreshPolicy { file } => masterfile::cli::refresh::run(settings, &file).await,
        Commands::Match {
            reference,
            chain,
            dry_run,
        } => masterfile::cli::matching::run(settings, &reference, chain, dry_run).await,
        Commands::Transfer { to, table } => {
            masterfile::cli::transfer::run(settings, &to, &table).await
        }
        Commands::List { chain } => masterfile::cli::list::run(settings, chain).await,
        Commands::ParsePolicy { text, chain } => masterfile::cli::parse::run(settings, &text, chain),
    }
}
