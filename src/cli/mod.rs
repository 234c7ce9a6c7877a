//! CLI module for cineload.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cineload - batch-load movie catalogues into a Pinecone index
///
/// Reads a CSV catalogue, renders each movie as text plus filterable
/// metadata, and upserts the records in fixed-size batches.
#[derive(Parser, Debug)]
#[command(name = "cineload")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a CSV catalogue and upsert it into the index in batches
    Ingest {
        /// Path to the CSV file
        input: PathBuf,

        /// Index to upsert into (overrides config)
        #[arg(long)]
        index: Option<String>,

        /// Namespace to upsert into (overrides config)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Documents per upsert call (overrides config)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Number of rows to read, 0 for all (overrides config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Normalize and batch without contacting the index
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the first normalized documents as JSON
    Preview {
        /// Path to the CSV file
        input: PathBuf,

        /// Number of documents to print
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },

    /// Show record counts per namespace
    Stats {
        /// Index to describe (overrides config)
        #[arg(long)]
        index: Option<String>,
    },

    /// Search the index by text
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: u32,

        /// Index to search (overrides config)
        #[arg(long)]
        index: Option<String>,

        /// Namespace to search (overrides config)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Metadata filter as JSON, e.g. '{"genre": {"$eq": "Drama"}}'
        #[arg(long)]
        filter: Option<String>,
    },

    /// Start MCP server for AI assistant integration
    Mcp,

    /// Check credentials, configuration and index reachability
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
