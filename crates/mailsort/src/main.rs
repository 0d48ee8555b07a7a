//! mailsort - keyword-based email categorization
//!
//! Scores each message against user-defined keyword categories and records
//! the winning category.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mailsort=debug,mailsort_core=debug"
    } else {
        "mailsort=info,mailsort_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path).await;
    let weights = settings
        .weights
        .clone()
        .merged_with(cli.weights.to_raw())
        .resolve();
    debug!(?weights, "Resolved weights");

    let db_path = cli
        .db
        .clone()
        .or_else(|| settings.database_path.clone())
        .unwrap_or_else(settings::default_database_path);
    let repository = commands::open_repository(&db_path).await?;

    match cli.command {
        Commands::Run { folder, root } => {
            let root = root
                .or(settings.maildir_root)
                .unwrap_or_else(|| PathBuf::from("."));
            commands::run(repository, root, &folder, weights).await
        }
        Commands::Score { file } => commands::score(&repository, &file, weights).await,
        Commands::Category { action } => commands::category(&repository, action).await,
    }
}
