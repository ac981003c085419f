//! Block-preserving chunker for subtitle files.
//!
//! Accumulates whole subtitle blocks until the target chunk size would be
//! exceeded, emits the chunk, then seeds the next one with a tail of
//! whole blocks whose cumulative text length fits the overlap budget.
//! A block is never split across chunks.

use crate::corpus::{Chunk, ChunkMetadata};
use crate::srt::block::SubtitleBlock;

/// Chunker that groups contiguous subtitle blocks into retrieval units.
///
/// # Examples
///
/// ```
/// use testigo::srt::{SubtitleChunker, parse_str};
///
/// let blocks = parse_str(
///     "1\n00:00:01,000 --> 00:00:02,000\nhola\n\n\
///      2\n00:00:03,000 --> 00:00:04,000\nadiós\n",
///     "demo.srt",
/// )
/// .unwrap();
/// let chunks = SubtitleChunker::new(1000, 150).chunk("demo.srt", &blocks);
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].metadata.num_blocks, 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SubtitleChunker {
    /// Target chunk size in characters.
    chunk_size: usize,
    /// Overlap budget in characters, spent on whole blocks.
    overlap: usize,
}

impl SubtitleChunker {
    /// Creates a chunker with the given size and overlap budgets.
    #[must_use]
    pub const fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Chunks the blocks of one source file.
    ///
    /// Overlap is measured youngest-block-first from the tail of the
    /// just-emitted chunk; the seed stops growing once adding the next
    /// older block would exceed the overlap budget.
    #[must_use]
    pub fn chunk(&self, source: &str, blocks: &[SubtitleBlock]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Vec<SubtitleBlock> = Vec::new();
        let mut current_len = 0usize;

        for block in blocks {
            if current_len + block.text.len() > self.chunk_size && !current.is_empty() {
                chunks.push(build_chunk(source, &current));

                let mut seed: Vec<SubtitleBlock> = Vec::new();
                let mut seed_len = 0usize;
                for tail in current.iter().rev() {
                    if seed_len + tail.text.len() > self.overlap {
                        break;
                    }
                    seed_len += tail.text.len() + 1;
                    seed.insert(0, tail.clone());
                }
                current = seed;
                current_len = seed_len;
            }

            current_len += block.text.len() + 1;
            current.push(block.clone());
        }

        if !current.is_empty() {
            chunks.push(build_chunk(source, &current));
        }
        chunks
    }
}

/// Renders the chunk content and metadata for a run of blocks.
///
/// Content lines carry millisecond-stripped prefixes; metadata keeps the
/// full-precision timestamps of the first and last block.
fn build_chunk(source: &str, blocks: &[SubtitleBlock]) -> Chunk {
    let content = blocks
        .iter()
        .map(SubtitleBlock::render_line)
        .collect::<Vec<_>>()
        .join("\n");

    let (first, last) = (&blocks[0], &blocks[blocks.len() - 1]);
    let metadata = ChunkMetadata {
        source: source.to_string(),
        start_time: first.start.to_string(),
        end_time: last.end.to_string(),
        start_seconds: first.start_seconds(),
        end_seconds: last.end_seconds(),
        duration_seconds: last.end_seconds() - first.start_seconds(),
        start_index: first.index,
        end_index: last.index,
        num_blocks: blocks.len(),
    };
    Chunk::new(content, metadata)
}
