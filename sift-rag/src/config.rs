//! Configuration for chunking, indexing, and search.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 3;
/// Default encoder variant.
pub const DEFAULT_ENCODER: &str = "mini";

/// Configuration parameters for the RAG pipeline.
///
/// These are the defaults applied when a request does not specify its own
/// indexing or search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from a search.
    pub top_k: usize,
    /// Name of the encoder variant used when none is requested.
    pub encoder_name: String,
    /// Upper bound on a single embedding call, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_timeout_ms: Option<u64>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            encoder_name: DEFAULT_ENCODER.to_string(),
            embed_timeout_ms: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The embedding timeout as a [`Duration`], if one is configured.
    pub fn embed_timeout(&self) -> Option<Duration> {
        self.embed_timeout_ms.map(Duration::from_millis)
    }

    /// The indexing options implied by this configuration.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            encoder_name: self.encoder_name.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from a search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the default encoder variant.
    pub fn encoder_name(mut self, name: impl Into<String>) -> Self {
        self.config.encoder_name = name.into();
        self
    }

    /// Bound every embedding call by `timeout`.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// An overlap greater than or equal to the chunk size is accepted; the
    /// chunker degrades gracefully in that case.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `top_k == 0`
    /// - `encoder_name` is blank
    /// - the embedding timeout is zero
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.encoder_name.trim().is_empty() {
            return Err(RagError::ConfigError("encoder_name must not be empty".to_string()));
        }
        if self.config.embed_timeout_ms == Some(0) {
            return Err(RagError::ConfigError(
                "embed_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// Per-document indexing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexOptions {
    /// Name of the encoder variant used to embed the chunks.
    pub encoder_name: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        RagConfig::default().index_options()
    }
}

impl IndexOptions {
    /// Check the parameters that do not depend on the encoder registry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if `chunk_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidInput("chunk_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}
