//! # endee-rag CLI
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `endee-rag ingest` | Rebuild the id map and insert every line under the documents directory |
//! | `endee-rag search <query...>` | Print the lines closest to the query |
//!
//! Both commands check the vector service's health endpoint first and stop
//! if it is unreachable.
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG=endee_rag=debug`
//! to see every decoded search hit.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use endee_rag::{config, ingest, search};

/// Index local documents into an Endee vector service and search them.
#[derive(Parser)]
#[command(name = "endee-rag", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/endee.toml` when that file exists, otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every non-blank line of the documents directory.
    ///
    /// Ensures the index exists, truncates the id map, embeds each line,
    /// and inserts the vectors in batches.
    Ingest,

    /// Search indexed lines.
    Search {
        /// Query text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Number of results to return (defaults to `search.k`).
        #[arg(long, short)]
        k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "endee_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest => {
            ingest::run_ingest(&cfg).await?;
        }
        Commands::Search { query, k } => {
            search::run_search(&cfg, &query.join(" "), k).await?;
        }
    }

    Ok(())
}
