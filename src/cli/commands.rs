//! CLI command execution.
//!
//! Dispatches parsed commands against the engine. Ingestion builds and
//! persists both index artifacts; querying loads them, wires the
//! external collaborators, and runs the pipeline on a local runtime.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::output::{self, OutputFormat, StatusReport};
use crate::cli::parser::{Cli, Commands};
use crate::config::EngineConfig;
use crate::error::{Error, IndexError, Result};
use crate::index::{CorpusStats, DenseIndex, IndexPaths, SparseIndex};
use crate::llm::{Embedder, EnvCredentials, OpenAiEmbedder, OpenAiGenerator};
use crate::pipeline::{QueryPipeline, QueryRequest};
use crate::srt;

/// Executes the parsed CLI command and returns its rendered output.
///
/// # Errors
///
/// Returns the underlying engine error; `main` is responsible for
/// formatting it according to the output format.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    match &cli.command {
        Commands::Ingest {
            corpus_dir,
            chunk_size,
            overlap,
            skip_dense,
            batch_size,
        } => ingest(
            &cli.index_dir,
            corpus_dir,
            *chunk_size,
            *overlap,
            *skip_dense,
            *batch_size,
            format,
        ),
        Commands::Query {
            question,
            exhaustive,
            sparse,
            timeout,
        } => query(
            &cli.index_dir,
            question,
            *exhaustive,
            *sparse,
            *timeout,
            format,
        ),
        Commands::Status => status(&cli.index_dir, format),
    }
}

#[allow(clippy::fn_params_excessive_bools)]
fn ingest(
    index_dir: &Path,
    corpus_dir: &Path,
    chunk_size: usize,
    overlap: usize,
    skip_dense: bool,
    batch_size: usize,
    format: OutputFormat,
) -> Result<String> {
    let config = EngineConfig::new().with_chunking(chunk_size, overlap);
    config.validate()?;

    let (chunks, stats) = srt::load_directory(corpus_dir, &config)?;
    let paths = IndexPaths::new(index_dir);
    std::fs::create_dir_all(index_dir).map_err(IndexError::from)?;

    let sparse = SparseIndex::build(&chunks);
    let corpus_stats = sparse.stats();
    sparse.save(&paths.sparse)?;
    write_stats(&paths.stats, &corpus_stats)?;

    let dense = if skip_dense {
        DenseIndex::from_parts(Vec::new(), Vec::new())?
    } else {
        let credentials = EnvCredentials::default();
        let embedder = OpenAiEmbedder::new(&credentials)?;
        let vectors = runtime()?.block_on(embed_all(&embedder, &chunks, batch_size))?;
        DenseIndex::from_parts(vectors, chunks)?
    };
    dense.save(&paths.dense)?;

    Ok(output::format_ingest(&stats, &corpus_stats, format))
}

/// Embeds all chunk contents in batches, preserving order.
async fn embed_all(
    embedder: &dyn Embedder,
    chunks: &[crate::corpus::Chunk],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        vectors.extend(embedder.embed(&texts).await?);
        tracing::debug!(embedded = vectors.len(), total = chunks.len(), "embedding corpus");
    }
    Ok(vectors)
}

fn query(
    index_dir: &Path,
    question: &str,
    exhaustive: bool,
    sparse_only: bool,
    timeout: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    let config = Arc::new(EngineConfig::default());
    let credentials = EnvCredentials::default();
    let embedder = Arc::new(OpenAiEmbedder::new(&credentials)?);
    let generator = Arc::new(OpenAiGenerator::new(&credentials)?);

    let paths = IndexPaths::new(index_dir);
    let pipeline = QueryPipeline::load(&paths, embedder, generator, config)?;

    let mut request = QueryRequest::new(question)
        .exhaustive(exhaustive)
        .sparse_only(sparse_only);
    if let Some(secs) = timeout {
        request = request.with_deadline(Duration::from_secs(secs));
    }

    let response = runtime()?.block_on(pipeline.query(&request))?;
    Ok(output::format_response(&response, format))
}

fn status(index_dir: &Path, format: OutputFormat) -> Result<String> {
    let paths = IndexPaths::new(index_dir);
    let report = StatusReport {
        sparse_present: paths.sparse.is_file(),
        dense_present: paths.dense.is_dir(),
        stats: std::fs::read(&paths.stats)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<CorpusStats>(&bytes).ok()),
    };
    Ok(output::format_status(&report, format))
}

fn write_stats(path: &Path, stats: &CorpusStats) -> Result<()> {
    let json = serde_json::to_vec_pretty(stats).map_err(IndexError::from)?;
    std::fs::write(path, json).map_err(IndexError::from)?;
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Config {
            message: format!("failed to start async runtime: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,319 --> 00:00:02,800\nAlaniso saluda a todos\n\n\
                          2\n00:00:03,000 --> 00:00:05,500\nel amor es el camino\n";

    fn cli_for(index_dir: &Path, command: Commands) -> Cli {
        Cli {
            index_dir: index_dir.to_path_buf(),
            verbose: false,
            format: "text".to_string(),
            command,
        }
    }

    #[test]
    fn test_status_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(dir.path(), Commands::Status);
        let out = execute(&cli).unwrap();
        assert!(out.contains("ausente"));
    }

    #[test]
    fn test_ingest_skip_dense_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        std::fs::write(corpus.join("charla.srt"), SAMPLE).unwrap();

        let index_dir = dir.path().join("idx");
        let cli = cli_for(
            &index_dir,
            Commands::Ingest {
                corpus_dir: corpus,
                chunk_size: 800,
                overlap: 150,
                skip_dense: true,
                batch_size: 64,
            },
        );
        let out = execute(&cli).unwrap();
        assert!(out.contains("Archivos procesados: 1"));

        let cli = cli_for(&index_dir, Commands::Status);
        let out = execute(&cli).unwrap();
        assert!(out.contains("Índice BM25:    disponible"));
        assert!(out.contains("Índice denso:   disponible"));
        assert!(out.contains("Documentos:"));
    }

    #[test]
    fn test_ingest_rejects_bad_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(
            dir.path(),
            Commands::Ingest {
                corpus_dir: dir.path().to_path_buf(),
                chunk_size: 100,
                overlap: 200,
                skip_dense: true,
                batch_size: 64,
            },
        );
        let err = execute(&cli).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }
}
