//! Error types for the `sift-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while chunking, embedding, indexing, or searching.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied parameter was rejected before any work started.
    ///
    /// Covers unknown encoder names, a zero `chunk_size`, `top_k < 1`,
    /// unsupported file types and malformed file names.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The text produced no chunks after sentence splitting.
    #[error("Empty content: {0}")]
    EmptyContent(String),

    /// The referenced document or stored file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external capability broke its contract, e.g. the embedding provider
    /// returned a different number of vectors than it was given texts.
    #[error("Contract violation ({capability}): {message}")]
    ContractViolation {
        /// The capability that misbehaved.
        capability: String,
        /// A description of the violation.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A filesystem operation on the text storage failed.
    #[error("Storage error ({}): {source}", path.display())]
    StorageError {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Shorthand for a [`RagError::ContractViolation`] raised against the embedding capability.
    pub(crate) fn embedding_contract(message: impl Into<String>) -> Self {
        Self::ContractViolation { capability: "embedding".to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
