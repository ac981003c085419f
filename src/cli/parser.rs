//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// testigo: forensic question answering over subtitle transcripts.
///
/// Builds hybrid BM25/vector indices from SubRip corpora and answers
/// questions with verbatim, timestamped citations.
#[derive(Parser, Debug)]
#[command(name = "testigo")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the index artifacts.
    #[arg(short, long, env = "TESTIGO_INDEX_DIR", default_value = ".testigo")]
    pub index_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a corpus of .srt files and build both index artifacts.
    Ingest {
        /// Directory containing the .srt corpus.
        corpus_dir: PathBuf,

        /// Target chunk size in characters.
        #[arg(long, default_value = "800")]
        chunk_size: usize,

        /// Overlap between chunks in characters.
        #[arg(long, default_value = "150")]
        overlap: usize,

        /// Skip embedding and write an empty dense artifact.
        ///
        /// Queries against such an index degrade to sparse-only.
        #[arg(long)]
        skip_dense: bool,

        /// Texts per embedding batch.
        #[arg(long, default_value = "64")]
        batch_size: usize,
    },

    /// Answer one question against the indexed corpus.
    Query {
        /// The natural-language question.
        question: String,

        /// Force exhaustive retrieval depth.
        #[arg(short, long)]
        exhaustive: bool,

        /// Retrieve with BM25 only, never touching the dense index.
        #[arg(long)]
        sparse: bool,

        /// Per-request deadline in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show index artifact status and corpus statistics.
    Status,
}
