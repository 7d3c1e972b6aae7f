//! # sift-rag
//!
//! Retrieval core for a small retrieval-augmented-generation service: split a
//! plain-text document into overlapping sentence-aligned chunks, embed each
//! chunk, and answer free-text queries with the most similar chunks.
//!
//! ## Overview
//!
//! - [`SentenceChunker`] packs sentences into chunks of at most `chunk_size`
//!   characters, carrying `chunk_overlap` trailing characters forward.
//! - [`SimilarityIndex`] stores one document's chunk embeddings and answers
//!   exact top-k queries by cosine similarity, ties broken by chunk id.
//! - [`EmbeddingProvider`] is the encoder seam; [`EncoderRegistry`] resolves
//!   the named `mini` and `labse` variants.
//! - [`RagPipeline`] ties chunking, embedding, and ranking together, and
//!   [`DocumentSlot`] holds the current document as an atomically swapped snapshot.
//! - [`TextStorage`] keeps the uploaded `.txt` files.
//!
//! ## Features
//!
//! - `openai` — [`openai::OpenAiCompatibleEmbeddingProvider`] for remote
//!   OpenAI-compatible embedding endpoints.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod encoder;
pub mod error;
pub mod hashing;
pub mod index;
pub mod pipeline;
pub mod sentence;
pub mod slot;
pub mod storage;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, SentenceChunker};
pub use config::{IndexOptions, RagConfig, RagConfigBuilder};
pub use document::{Chunk, DocumentSummary, IndexedDocument, SearchResult};
pub use embedding::EmbeddingProvider;
pub use encoder::{EncoderRegistry, LABSE_ENCODER, MINI_ENCODER};
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use index::SimilarityIndex;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use sentence::{SentenceSplitter, UnicodeSentenceSplitter};
pub use slot::DocumentSlot;
pub use storage::{StoredFile, TextStorage};
