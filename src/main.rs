//! # Triage Harness CLI (`triage`)
//!
//! The `triage` binary drives the pipeline: store initialization, knowledge
//! base ingestion, retrieval inspection, and ticket answering.
//!
//! ## Usage
//!
//! ```bash
//! triage --config ./config/triage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `triage init` | Create the SQLite store and collection |
//! | `triage ingest` | Scan the knowledge base and index new chunks |
//! | `triage ask <ticket>` | Retrieve context for a ticket and generate an answer |
//! | `triage search "<query>"` | Inspect retrieval without calling the LLM |
//! | `triage stats` | Show record counts for the collection |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use triage_harness::config;
use triage_harness::embedding::{create_embedder, DisabledEmbedder, Embedder};
use triage_harness::ingest;
use triage_harness::retrieve;
use triage_harness::store::{Collection, SqliteCollection};

/// Triage Harness — a local-first knowledge-base harness for
/// retrieval-augmented support ticket triage.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/triage.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "triage",
    about = "Triage Harness — retrieval-augmented support ticket triage over a local knowledge base",
    version,
    long_about = "Triage Harness ingests a directory tree of documents (PDFs, captions, text, \
    code, videos with sidecar transcripts) into a deduplicated chunk index, and answers support \
    tickets by nearest-neighbor retrieval plus an LLM call."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/triage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store.
    ///
    /// Creates the SQLite database file and the configured collection.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Scan the knowledge base and index new chunks.
    ///
    /// Walks the configured root, extracts and chunks every supported
    /// document, and adds only the chunks whose ID is not already in the
    /// store. Running twice against an unchanged tree indexes nothing.
    Ingest {
        /// Show scan counts without writing to the store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer a support ticket from the indexed knowledge base.
    ///
    /// Extracts the ticket document, retrieves the nearest chunks, and
    /// prints a generated course of action. Requires `GOOGLE_API_KEY`
    /// unless `--no-llm` is given.
    Ask {
        /// Path to the ticket document (any supported format).
        ticket: PathBuf,

        /// Number of context chunks to retrieve.
        #[arg(long)]
        k: Option<usize>,

        /// Print the retrieved context only; skip the LLM call.
        #[arg(long)]
        no_llm: bool,
    },

    /// Query the index directly.
    ///
    /// Prints the top matching chunks with IDs, type tags, and snippets.
    Search {
        /// The query text.
        query: String,

        /// Number of results to return.
        #[arg(long)]
        k: Option<usize>,
    },

    /// Show record counts for the collection.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            // Initialization never embeds, so a misconfigured provider
            // cannot block it.
            let collection =
                SqliteCollection::open(&cfg.store, Box::new(DisabledEmbedder)).await?;
            collection.close().await;
            println!("Store initialized successfully.");
        }
        Commands::Ingest { dry_run } => {
            // Ingestion never depends on embedding credentials; without a
            // provider, chunks are indexed vectorless.
            let embedder: Box<dyn Embedder> = match create_embedder(&cfg.embedding) {
                Ok(e) => e,
                Err(e) => {
                    eprintln!(
                        "Warning: could not create embedding provider ({:#}); \
                         proceeding without embeddings",
                        e
                    );
                    Box::new(DisabledEmbedder)
                }
            };
            let collection = SqliteCollection::open(&cfg.store, embedder).await?;
            let summary = ingest::run_ingest(&cfg, &collection, dry_run).await?;
            collection.close().await;
            if summary.failed_batches > 0 {
                anyhow::bail!(
                    "{} batch(es) failed to index; re-run ingest to retry them",
                    summary.failed_batches
                );
            }
        }
        Commands::Ask { ticket, k, no_llm } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let collection = SqliteCollection::open(&cfg.store, embedder).await?;
            retrieve::run_ask(&cfg, &collection, &ticket, k, no_llm).await?;
            collection.close().await;
        }
        Commands::Search { query, k } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let collection = SqliteCollection::open(&cfg.store, embedder).await?;
            retrieve::run_search(&cfg, &collection, &query, k).await?;
            collection.close().await;
        }
        Commands::Stats => {
            let collection =
                SqliteCollection::open(&cfg.store, Box::new(DisabledEmbedder)).await?;
            let total = collection.count().await?;
            println!("collection: {}", cfg.store.collection);
            println!("records: {}", total);
            for (doc_type, n) in collection.type_counts().await? {
                println!("  {:<18} {}", doc_type, n);
            }
            collection.close().await;
        }
    }

    Ok(())
}
