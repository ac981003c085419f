//! Retrieval units for the subtitle corpus.
//!
//! A [`Chunk`] is the immutable unit of retrieval: the rendered text of
//! one or more contiguous subtitle blocks, each line carrying its own
//! timestamp prefix, plus structured metadata tying the chunk back to its
//! source file and block range. Chunks are created during offline
//! ingestion and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Number of leading characters used as the fusion deduplication key.
const DEDUP_KEY_LEN: usize = 100;

/// Metadata attached to every chunk.
///
/// Timestamps are stored at full `HH:MM:SS,mmm` precision here even
/// though the in-content prefixes strip milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name.
    pub source: String,
    /// Start time of the first contained block, full precision.
    pub start_time: String,
    /// End time of the last contained block, full precision.
    pub end_time: String,
    /// Start of the chunk in seconds.
    pub start_seconds: f64,
    /// End of the chunk in seconds.
    pub end_seconds: f64,
    /// Covered span in seconds.
    pub duration_seconds: f64,
    /// Ordinal of the first contained block (1-based, per source file).
    pub start_index: u32,
    /// Ordinal of the last contained block.
    pub end_index: u32,
    /// Number of subtitle blocks merged into this chunk.
    pub num_blocks: usize,
}

impl ChunkMetadata {
    /// Rough richness measure used when deduplication must pick one of
    /// two representatives: more blocks and a named source win.
    #[must_use]
    pub fn richness(&self) -> usize {
        let named = usize::from(!self.source.is_empty());
        self.num_blocks * 2 + named
    }
}

/// A retrievable unit of subtitle text.
///
/// # Examples
///
/// ```
/// use testigo::corpus::{Chunk, ChunkMetadata};
///
/// let chunk = Chunk::new(
///     "[00:00:01 --> 00:00:04] Hola a todos".to_string(),
///     ChunkMetadata {
///         source: "charla_01.srt".to_string(),
///         start_time: "00:00:01,319".to_string(),
///         end_time: "00:00:04,800".to_string(),
///         start_seconds: 1.319,
///         end_seconds: 4.8,
///         duration_seconds: 3.481,
///         start_index: 1,
///         end_index: 1,
///         num_blocks: 1,
///     },
/// );
/// assert_eq!(chunk.metadata.num_blocks, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Rendered chunk text, one `[HH:MM:SS --> HH:MM:SS] text` line per block.
    pub content: String,
    /// Structured source metadata.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub const fn new(content: String, metadata: ChunkMetadata) -> Self {
        Self { content, metadata }
    }

    /// Returns the chunk size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Stable deduplication key: the first 100 characters of content.
    ///
    /// Highly similar chunks can collide; callers resolve collisions by
    /// keeping the representative with the richer metadata.
    #[must_use]
    pub fn dedup_key(&self) -> &str {
        let end = find_char_boundary(&self.content, DEDUP_KEY_LEN);
        &self.content[..end]
    }
}

/// Finds a valid UTF-8 character boundary at or before the given position.
fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}
