//! Data types for chunks, indexed documents, and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::index::SimilarityIndex;

/// A contiguous span of document text indexed as one retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of the chunk in production order.
    pub chunk_id: usize,
    /// The chunk text. Never empty.
    pub text: String,
}

/// A retrieved chunk paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The index of the chunk within its document.
    pub chunk_id: usize,
    /// The similarity score (higher is more relevant), in `[-1, 1]`.
    pub score: f32,
    /// The chunk text.
    pub text: String,
}

/// A document that has been chunked, embedded, and indexed.
///
/// Immutable once built. Replacing the current document means building a new
/// `IndexedDocument` and swapping it into a [`DocumentSlot`](crate::DocumentSlot).
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// Fresh UUID assigned on every load.
    pub document_id: String,
    /// Name of the file the text came from.
    pub file_name: String,
    /// The full source text.
    pub raw_text: String,
    /// Encoder variant used for the chunk embeddings. Queries must use the same one.
    pub encoder_name: String,
    /// Chunk size the document was split with.
    pub chunk_size: usize,
    /// Chunk overlap the document was split with.
    pub chunk_overlap: usize,
    /// When the document was indexed.
    pub indexed_at: DateTime<Utc>,
    /// Chunks and their embeddings.
    pub index: SimilarityIndex,
}

impl IndexedDocument {
    /// The indexed chunks in order.
    pub fn chunks(&self) -> &[Chunk] {
        self.index.chunks()
    }

    /// Metadata about this document, without its text or vectors.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            document_id: self.document_id.clone(),
            file_name: self.file_name.clone(),
            num_chars: self.raw_text.chars().count(),
            num_chunks: self.index.len(),
            encoder_name: self.encoder_name.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

/// Metadata describing an [`IndexedDocument`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub document_id: String,
    pub file_name: String,
    /// Length of the raw text in characters.
    pub num_chars: usize,
    pub num_chunks: usize,
    pub encoder_name: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}
