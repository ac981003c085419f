//! Context rendering for the generation prompt.
//!
//! Renders retrieved chunks into a single prompt-ready block. Per-block
//! timestamp prefixes inside chunk content pass through untouched; only
//! legacy chunks that lack a prefix get one synthesized from metadata.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::corpus::Chunk;

/// Separator between rendered chunks.
const SEPARATOR: &str = "\n\n---\n\n";

/// Millisecond-stripped timestamp prefix at the start of a content line.
#[allow(clippy::unwrap_used)]
static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\d{2}:\d{2}:\d{2} --> \d{2}:\d{2}:\d{2}\]").unwrap()
});

/// Renders retrieved chunks into one context string.
///
/// Each chunk appears as a `Documento:` header followed by its content;
/// chunks are separated by a `---` line surrounded by blank lines.
#[must_use]
pub fn format_context(chunks: &[Chunk]) -> String {
    let mut rendered = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let mut block = String::new();
        let _ = writeln!(block, "Documento: {}", chunk.metadata.source);

        if PREFIX.is_match(&chunk.content) {
            block.push_str(&chunk.content);
        } else {
            // Legacy chunk without embedded prefixes: synthesize one
            // top-of-range line from metadata, milliseconds stripped.
            let _ = writeln!(
                block,
                "[{} --> {}]",
                strip_millis(&chunk.metadata.start_time),
                strip_millis(&chunk.metadata.end_time)
            );
            block.push_str(&chunk.content);
        }
        rendered.push(block);
    }
    rendered.join(SEPARATOR)
}

/// Drops the `,mmm` part of an `HH:MM:SS,mmm` timestamp.
fn strip_millis(timestamp: &str) -> &str {
    timestamp.split(',').next().unwrap_or(timestamp)
}
