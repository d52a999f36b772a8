use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clause_radar::{Config, ContractRecommender};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "clause-radar")]
#[command(about = "Mine contract clauses by keyword and search them by meaning")]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index contract PDFs against a list of keywords
    Index {
        /// Keywords or phrases, separated by commas
        #[arg(short, long)]
        keywords: String,
        /// Contract PDFs; each file stem becomes the contract id
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Find the snippets closest to a free-text query
    Search {
        /// Keyword or free-text query
        query: String,
        /// Number of results, clamped to the number of indexed snippets
        #[arg(short = 'k', long, default_value_t = commands::DEFAULT_TOP_K)]
        top_k: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how many vectors the index holds
    Stats,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // A missing .env file is fine; the variables may come from the shell.
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);

    let config = Config::from_env().context("failed to load configuration")?;
    let recommender = ContractRecommender::from_config(&config)
        .await
        .context("failed to connect to the embedding provider or vector store")?;

    match cli.command {
        Commands::Index { keywords, files } => {
            commands::index(&recommender, &keywords, &files).await?;
        }
        Commands::Search { query, top_k, json } => {
            commands::search(&recommender, &query, top_k, json).await?;
        }
        Commands::Stats => {
            commands::stats(&recommender).await?;
        }
    }

    Ok(())
}
