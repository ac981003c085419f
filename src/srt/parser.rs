//! SRT parsing and corpus ingestion.
//!
//! Parses SubRip files into [`SubtitleBlock`]s and drives the offline
//! ingestion pass over a corpus directory. Files are decoded as UTF-8
//! with a Latin-1 fallback; a malformed file is skipped, recorded in the
//! ingestion statistics, and never aborts the run.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::corpus::Chunk;
use crate::error::{IngestError, Result};
use crate::srt::block::SubtitleBlock;
use crate::srt::chunker::SubtitleChunker;

/// Timestamp line of an SRT block: `HH:MM:SS,mmm --> HH:MM:SS,mmm`.
#[allow(clippy::unwrap_used)]
static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2},\d{3})$").unwrap()
});

/// Statistics accumulated over one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    /// Files parsed and chunked successfully.
    pub files_processed: usize,
    /// Chunks emitted across all files.
    pub total_chunks: usize,
    /// Subtitle blocks parsed across all files.
    pub total_blocks: usize,
    /// Names of files that were skipped as malformed or unreadable.
    pub failed_files: Vec<String>,
}

/// Parses SRT content that has already been decoded to a string.
///
/// Blocks are groups of lines separated by blank lines:
/// ordinal, timestamp line, then one or more text lines. Text lines are
/// collapsed into a single line so that every rendered content line
/// carries exactly one timestamp prefix.
///
/// # Errors
///
/// Returns [`IngestError::MalformedEntry`] when no block can be parsed,
/// when a time range is inverted, or when ordinals are not strictly
/// increasing.
pub fn parse_str(content: &str, file: &str) -> std::result::Result<Vec<SubtitleBlock>, IngestError> {
    let malformed = |reason: String| IngestError::MalformedEntry {
        file: file.to_string(),
        reason,
    };

    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut blocks: Vec<SubtitleBlock> = Vec::new();

    for group in content.split("\n\n").map(str::trim).filter(|g| !g.is_empty()) {
        let mut lines = group.lines();
        let Some(index_line) = lines.next() else {
            continue;
        };
        let Ok(index) = index_line.trim().parse::<u32>() else {
            // Stray text between blocks; tolerated like any other junk.
            continue;
        };
        let Some(time_line) = lines.next() else {
            continue;
        };
        let Some(caps) = TIMESTAMP_LINE.captures(time_line.trim()) else {
            continue;
        };

        let start = caps[1]
            .parse()
            .map_err(|e: String| malformed(format!("block {index}: {e}")))?;
        let end = caps[2]
            .parse()
            .map_err(|e: String| malformed(format!("block {index}: {e}")))?;

        let text = lines.map(str::trim).collect::<Vec<_>>().join(" ");
        let block = SubtitleBlock::new(index, start, end, text.trim().to_string());

        if !block.is_well_formed() {
            return Err(malformed(format!(
                "block {index}: start {} after end {}",
                block.start, block.end
            )));
        }
        if let Some(prev) = blocks.last()
            && index <= prev.index
        {
            return Err(malformed(format!(
                "ordinal {index} does not increase after {}",
                prev.index
            )));
        }
        blocks.push(block);
    }

    if blocks.is_empty() {
        return Err(malformed("no valid subtitle blocks".to_string()));
    }
    Ok(blocks)
}

/// Parses one `.srt` file from disk.
///
/// # Errors
///
/// Returns [`IngestError::ReadFailed`] when the file cannot be read and
/// [`IngestError::MalformedEntry`] when it cannot be parsed.
pub fn parse_file(path: &Path) -> std::result::Result<Vec<SubtitleBlock>, IngestError> {
    let file_name = display_name(path);
    let bytes = std::fs::read(path).map_err(|e| IngestError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_str(&decode(bytes), &file_name)
}

/// Decodes file bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback is total and cannot fail.
#[must_use]
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Loads and chunks every `.srt` file under a directory.
///
/// Files are processed in parallel but accumulated in deterministic
/// (name-sorted) order. Per-file failures are recorded in the returned
/// [`IngestStats`] and do not abort the run.
///
/// # Errors
///
/// Returns [`IngestError::EmptyCorpus`] when the directory holds no
/// `.srt` files, or an I/O error when the directory cannot be listed.
pub fn load_directory(dir: &Path, config: &EngineConfig) -> Result<(Vec<Chunk>, IngestStats)> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| IngestError::ReadFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("srt")))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(IngestError::EmptyCorpus {
            path: dir.display().to_string(),
        }
        .into());
    }

    tracing::info!(files = files.len(), dir = %dir.display(), "ingesting corpus");

    let chunker = SubtitleChunker::new(config.chunk_size, config.chunk_overlap);
    let parsed: Vec<(String, std::result::Result<Vec<SubtitleBlock>, IngestError>)> = files
        .par_iter()
        .map(|path| (display_name(path), parse_file(path)))
        .collect();

    let mut chunks = Vec::new();
    let mut stats = IngestStats::default();
    for (file_name, outcome) in parsed {
        match outcome {
            Ok(blocks) => {
                let file_chunks = chunker.chunk(&file_name, &blocks);
                stats.files_processed += 1;
                stats.total_blocks += blocks.len();
                stats.total_chunks += file_chunks.len();
                chunks.extend(file_chunks);
            }
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "skipping corpus file");
                stats.failed_files.push(file_name);
            }
        }
    }

    tracing::info!(
        files = stats.files_processed,
        chunks = stats.total_chunks,
        blocks = stats.total_blocks,
        failed = stats.failed_files.len(),
        "ingestion complete"
    );
    Ok((chunks, stats))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const SAMPLE: &str = "1\n00:00:01,319 --> 00:00:02,800\nHola a todos\n\n\
                          2\n00:00:03,000 --> 00:00:05,500\nbienvenidos a la charla\n";

    #[test]
    fn test_parse_two_blocks() {
        let blocks = parse_str(SAMPLE, "sample.srt").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].index, 1);
        assert_eq!(blocks[0].text, "Hola a todos");
        assert!((blocks[0].start_seconds() - 1.319).abs() < 1e-9);
        assert!((blocks[1].end_seconds() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let crlf = format!("\u{feff}{}", SAMPLE.replace('\n', "\r\n"));
        let blocks = parse_str(&crlf, "sample.srt").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "bienvenidos a la charla");
    }

    #[test]
    fn test_parse_multiline_text_collapses() {
        let content = "1\n00:00:01,000 --> 00:00:04,000\nprimera línea\nsegunda línea\n";
        let blocks = parse_str(content, "f.srt").unwrap();
        assert_eq!(blocks[0].text, "primera línea segunda línea");
    }

    #[test]
    fn test_parse_skips_junk_between_blocks() {
        let content = format!("comentario suelto\n\n{SAMPLE}");
        let blocks = parse_str(&content, "f.srt").unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_parse_rejects_empty() {
        let err = parse_str("solo texto sin bloques", "f.srt").unwrap_err();
        assert!(err.to_string().contains("no valid subtitle blocks"));
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        let content = "1\n00:00:05,000 --> 00:00:01,000\ntexto\n";
        assert!(parse_str(content, "f.srt").is_err());
    }

    #[test]
    fn test_parse_rejects_non_increasing_ordinals() {
        let content = "2\n00:00:01,000 --> 00:00:02,000\nuno\n\n\
                       2\n00:00:03,000 --> 00:00:04,000\ndos\n";
        let err = parse_str(content, "f.srt").unwrap_err();
        assert!(err.to_string().contains("does not increase"));
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode("señal".as_bytes().to_vec()), "señal");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // "señal" encoded as Latin-1: ñ = 0xF1, invalid as UTF-8.
        let bytes = vec![b's', b'e', 0xF1, b'a', b'l'];
        assert_eq!(decode(bytes), "señal");
    }

    #[test]
    fn test_load_directory_mixed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.srt"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("b.srt"), "basura").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignorado").unwrap();

        // Latin-1 encoded file must survive via the fallback.
        let mut latin = std::fs::File::create(dir.path().join("c.srt")).unwrap();
        latin
            .write_all(b"1\n00:00:01,000 --> 00:00:02,000\nse\xf1al\n")
            .unwrap();

        let config = EngineConfig::default();
        let (chunks, stats) = load_directory(dir.path(), &config).unwrap();

        assert_eq!(stats.files_processed, 2);
        assert_eq!(stats.failed_files, vec!["b.srt".to_string()]);
        assert_eq!(stats.total_blocks, 3);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().any(|c| c.content.contains("señal")));
    }

    #[test]
    fn test_load_directory_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_directory(dir.path(), &EngineConfig::default()).unwrap_err();
        assert_eq!(err.code(), "malformed_corpus_entry");
    }
}
