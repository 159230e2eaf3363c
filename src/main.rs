//! Nova CLI entry point.

use anyhow::Result;
use clap::Parser;
use nova::cli::{commands, Cli, Commands};
use nova::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("nova={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest { path } => {
            commands::run_ingest(path, settings).await?;
        }

        Commands::Ask { question, kind } => {
            commands::run_ask(question, kind.clone(), settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            commands::run_search(query, *limit, *min_score, settings).await?;
        }

        Commands::Remember {
            text,
            title,
            tags,
            supersedes,
        } => {
            commands::run_remember(
                text,
                title.clone(),
                tags.clone(),
                supersedes.clone(),
                settings,
            )
            .await?;
        }

        Commands::Recall { query } => {
            commands::run_recall(query, settings).await?;
        }

        Commands::Summarize {
            input,
            language,
            index,
        } => {
            commands::run_summarize(input, language.clone(), *index, settings).await?;
        }

        Commands::List { notes, all } => {
            commands::run_list(*notes, *all, settings).await?;
        }

        Commands::Delete { source_id } => {
            commands::run_delete(source_id, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
