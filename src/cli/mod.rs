//! CLI layer for testigo.
//!
//! Provides the command-line interface using clap, with commands for
//! ingesting a corpus, querying it, and inspecting index status.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
