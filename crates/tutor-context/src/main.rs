//! # Tutor Context CLI (`tutorctx`)
//!
//! The `tutorctx` binary drives the retrieval pipeline from the command
//! line and hosts the HTTP tool server.
//!
//! ## Usage
//!
//! ```bash
//! tutorctx --config ./config/tutor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tutorctx retrieve "<question>"` | Retrieve ranked context + citations for a question |
//! | `tutorctx serve` | Start the HTTP tool server |
//!
//! ## Examples
//!
//! ```bash
//! # Anonymous query against the knowledge base
//! tutorctx retrieve "why does a gyroscope precess?"
//!
//! # Scoped to a user's materials and their pinned book
//! tutorctx retrieve "derive the wave equation" --owner u-17 --book feynman-vol1
//!
//! # Show the scoring breakdown
//! tutorctx retrieve "what is torque?" --explain --top-k 3
//!
//! # Start the tool server
//! tutorctx serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tutor_context::config;
use tutor_context::embedding::create_embedder;
use tutor_context::retrieve::{run_retrieve, RetrieveRequest, Retriever, RetrieverOptions};
use tutor_context::server;
use tutor_context::vector_store::QdrantStore;

/// Tutor Context CLI — source-prioritized context retrieval for an AI tutor.
#[derive(Parser)]
#[command(
    name = "tutorctx",
    about = "Tutor Context — source-prioritized context retrieval for an AI tutor",
    version,
    long_about = "Tutor Context embeds a question, fans out scoped vector searches (user \
    materials, pinned book, knowledge base), re-ranks the merged candidates with \
    trust-weighted scoring, and returns a cited context bundle via a CLI and an HTTP tool server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tutor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Retrieve ranked context and citations for a question.
    Retrieve {
        /// The question to retrieve context for.
        question: String,

        /// Requesting user id; scopes the user-materials search.
        /// Omit for an anonymous query.
        #[arg(long)]
        owner: Option<String>,

        /// Pinned book id, if the user selected a preferred reference.
        #[arg(long)]
        book: Option<String>,

        /// Maximum number of context items to return.
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the per-item scoring breakdown.
        #[arg(long)]
        explain: bool,
    },

    /// Start the HTTP tool server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Retrieve {
            question,
            owner,
            book,
            top_k,
            explain,
        } => {
            let embedder = create_embedder(&cfg.embedding)?;
            let index = std::sync::Arc::new(QdrantStore::new(&cfg.vector_store)?);
            let retriever = Retriever::new(embedder, index, RetrieverOptions::from_config(&cfg));
            let request = RetrieveRequest {
                question,
                owner_id: owner,
                selected_book_id: book,
                top_k,
            };
            run_retrieve(&retriever, &request, explain).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
