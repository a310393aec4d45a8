//! Chunking: split document text into overlapping, size-bounded pieces.
//!
//! Splitting is delegated to [`text_splitter::TextSplitter`] with a character
//! sizer. It descends through semantic levels until each piece fits the
//! budget, which matches the separator priority
//! `"\n\n"` → `"\n"` → sentence end (`"。"`, `"."`) → `" "`, and then merges
//! neighbouring pieces with the configured overlap.

use crate::error::CurateError;
use crate::output::{Chunk, DocumentMetadata};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Character-budget chunker.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker; `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, CurateError> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| CurateError::Chunking(e.to_string()))?;
        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered chunks, copying document identity from
    /// `metadata` when given.
    pub fn chunk(&self, text: &str, metadata: Option<&DocumentMetadata>) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .splitter
            .chunk_indices(text)
            .enumerate()
            .map(|(i, (offset, piece))| Chunk {
                chunk_id: i,
                text: piece.to_string(),
                start_offset: offset,
                char_count: piece.chars().count(),
                word_count: piece.split_whitespace().count(),
                document_id: metadata.map(|m| m.document_id.clone()),
                source_file: metadata.map(|m| m.filename.clone()),
                category: metadata.map(|m| m.category.clone()),
            })
            .collect();
        debug!("Split {} chars into {} chunks", text.len(), chunks.len());
        chunks
    }
}
