//! Cineload CLI entry point.

use anyhow::Result;
use clap::Parser;
use cineload::cli::{commands, Cli, Commands};
use cineload::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let mut settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    // stdout carries MCP traffic and command output
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cineload={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        Commands::Ingest {
            input,
            index,
            namespace,
            batch_size,
            limit,
            dry_run,
        } => {
            if let Some(index) = index {
                settings.index.name = index.clone();
            }
            if let Some(namespace) = namespace {
                settings.index.namespace = namespace.clone();
            }
            if let Some(batch_size) = batch_size {
                settings.ingest.batch_size = *batch_size;
            }
            if let Some(limit) = limit {
                settings.ingest.limit = *limit;
            }
            commands::run_ingest(input, *dry_run, settings).await?;
        }

        Commands::Preview { input, count } => {
            commands::run_preview(input, *count, settings)?;
        }

        Commands::Stats { index } => {
            if let Some(index) = index {
                settings.index.name = index.clone();
            }
            commands::run_stats(settings).await?;
        }

        Commands::Search {
            query,
            top_k,
            index,
            namespace,
            filter,
        } => {
            if let Some(index) = index {
                settings.index.name = index.clone();
            }
            if let Some(namespace) = namespace {
                settings.index.namespace = namespace.clone();
            }
            commands::run_search(query, *top_k, filter.as_deref(), settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path.as_ref())?;
        }
    }

    Ok(())
}
