//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use std::fmt::Write;

use serde::Serialize;

use crate::error::Error;
use crate::index::CorpusStats;
use crate::pipeline::QueryResponse;
use crate::srt::IngestStats;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Index artifact status for the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Sparse artifact exists on disk.
    pub sparse_present: bool,
    /// Dense artifact directory exists on disk.
    pub dense_present: bool,
    /// Corpus statistics, when the sidecar is readable.
    pub stats: Option<CorpusStats>,
}

/// Formats an ingestion summary.
#[must_use]
pub fn format_ingest(stats: &IngestStats, corpus: &CorpusStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str("Ingesta completada\n");
            out.push_str("==================\n\n");
            let _ = writeln!(out, "  Archivos procesados: {}", stats.files_processed);
            let _ = writeln!(out, "  Chunks generados:    {}", stats.total_chunks);
            let _ = writeln!(out, "  Bloques:             {}", stats.total_blocks);
            let _ = writeln!(out, "  Archivos fallidos:   {}", stats.failed_files.len());
            for file in &stats.failed_files {
                let _ = writeln!(out, "    - {file}");
            }
            let _ = writeln!(out, "  Longitud media:      {:.1} tokens", corpus.avg_doc_length);
            let _ = writeln!(out, "  Tokens totales:      {}", corpus.total_tokens);
            out
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct IngestReport<'a> {
                ingest: &'a IngestStats,
                corpus: &'a CorpusStats,
            }
            format_json(&IngestReport {
                ingest: stats,
                corpus,
            })
        }
    }
}

/// Formats a query response.
#[must_use]
pub fn format_response(response: &QueryResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&response.answer);
            out.push_str("\n\n");
            let _ = writeln!(
                out,
                "Plan:       {} (k={}) — {}",
                response.plan.level, response.plan.k, response.plan.reason
            );
            let _ = writeln!(out, "Método:     {}", response.method);
            let _ = writeln!(out, "Fragmentos: {}", response.retrieved);
            let _ = writeln!(
                out,
                "Tiempos:    retrieval {} ms, generación {} ms, total {} ms",
                response.timings.retrieval_ms,
                response.timings.generation_ms,
                response.timings.total_ms
            );
            if !response.warnings.is_empty() {
                let _ = writeln!(out, "Avisos:");
                for warning in &response.warnings {
                    let _ = writeln!(out, "  - {warning}");
                }
            }
            out
        }
        OutputFormat::Json => format_json(response),
    }
}

/// Formats an index status report.
#[must_use]
pub fn format_status(report: &StatusReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str("Estado del índice\n");
            out.push_str("=================\n\n");
            let present = |ok: bool| if ok { "disponible" } else { "ausente" };
            let _ = writeln!(out, "  Índice BM25:    {}", present(report.sparse_present));
            let _ = writeln!(out, "  Índice denso:   {}", present(report.dense_present));
            if let Some(stats) = &report.stats {
                let _ = writeln!(out, "  Documentos:     {}", stats.total_docs);
                let _ = writeln!(out, "  Longitud media: {:.1} tokens", stats.avg_doc_length);
                let _ = writeln!(out, "  Tokens totales: {}", stats.total_tokens);
            }
            out
        }
        OutputFormat::Json => format_json(report),
    }
}

/// Formats an error for the chosen output format.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorReport<'a> {
                error: &'a str,
                message: String,
            }
            format_json(&ErrorReport {
                error: error.code(),
                message: error.to_string(),
            })
        }
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization\", \"message\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_format_ingest_text() {
        let stats = IngestStats {
            files_processed: 3,
            total_chunks: 12,
            total_blocks: 40,
            failed_files: vec!["roto.srt".to_string()],
        };
        let corpus = CorpusStats {
            total_docs: 12,
            avg_doc_length: 95.5,
            total_tokens: 1146,
        };
        let out = format_ingest(&stats, &corpus, OutputFormat::Text);
        assert!(out.contains("Archivos procesados: 3"));
        assert!(out.contains("roto.srt"));
        assert!(out.contains("95.5"));
    }

    #[test]
    fn test_format_ingest_json_field_names() {
        let stats = IngestStats::default();
        let corpus = CorpusStats {
            total_docs: 0,
            avg_doc_length: 0.0,
            total_tokens: 0,
        };
        let out = format_ingest(&stats, &corpus, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value.get("ingest").is_some());
        assert!(value["corpus"].get("total_docs").is_some());
    }

    #[test]
    fn test_format_status_text() {
        let report = StatusReport {
            sparse_present: true,
            dense_present: false,
            stats: None,
        };
        let out = format_status(&report, OutputFormat::Text);
        assert!(out.contains("Índice BM25:    disponible"));
        assert!(out.contains("Índice denso:   ausente"));
    }

    #[test]
    fn test_format_error_json_carries_code() {
        let err = Error::Config {
            message: "bad".to_string(),
        };
        let out = format_error(&err, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["error"], "invalid_config");
    }
}
