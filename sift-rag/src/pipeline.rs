//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the index-and-query workflow by composing
//! a [`SentenceSplitter`], the [`SentenceChunker`], an [`EncoderRegistry`],
//! and the [`SimilarityIndex`].
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_rag::{DocumentSlot, IndexOptions, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder().config(RagConfig::default()).build()?;
//! let slot = DocumentSlot::new();
//!
//! let document = pipeline.index_document("notes.txt", text, &IndexOptions::default()).await?;
//! let document = slot.replace(document).await;
//! let results = pipeline.search(&document, "search query", 3).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::chunking::{Chunker, SentenceChunker};
use crate::config::{IndexOptions, RagConfig};
use crate::document::{IndexedDocument, SearchResult};
use crate::encoder::EncoderRegistry;
use crate::error::{RagError, Result};
use crate::index::SimilarityIndex;
use crate::sentence::{SentenceSplitter, UnicodeSentenceSplitter};

/// The RAG pipeline orchestrator.
///
/// Indexing runs validate → chunk → embed → build; searching runs
/// validate → embed → rank. All parameter checks happen before any chunking
/// or embedding work, and nothing is shared between calls, so a failed call
/// has no side effects. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    encoders: EncoderRegistry,
    splitter: Arc<dyn SentenceSplitter>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the encoder registry.
    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    /// A chunker with the given parameters and this pipeline's splitter.
    pub fn chunker(&self, chunk_size: usize, chunk_overlap: usize) -> SentenceChunker {
        SentenceChunker::new(chunk_size, chunk_overlap).with_splitter(Arc::clone(&self.splitter))
    }

    /// Chunk, embed, and index `text`.
    ///
    /// The returned document has a fresh `document_id`. It is not made current
    /// here; pass it to [`DocumentSlot::replace`](crate::DocumentSlot::replace).
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] for an unknown encoder or a zero chunk size.
    /// - [`RagError::EmptyContent`] if the text yields no chunks.
    /// - [`RagError::EmbeddingError`] if the encoder fails or times out.
    /// - [`RagError::ContractViolation`] if the encoder output is malformed.
    pub async fn index_document(
        &self,
        file_name: &str,
        text: String,
        options: &IndexOptions,
    ) -> Result<IndexedDocument> {
        options.validate()?;
        let encoder = self.encoders.get(&options.encoder_name)?;

        // 1. Chunk the text
        let chunks = self.chunker(options.chunk_size, options.chunk_overlap).chunk(&text);
        if chunks.is_empty() {
            info!(file_name, chunk_count = 0, "document has no text");
            return Err(RagError::EmptyContent(format!("'{file_name}' contains no text")));
        }
        let chunk_count = chunks.len();

        // 2. Embed and index
        let index = self
            .with_timeout(encoder.name(), SimilarityIndex::build(chunks, encoder.as_ref()))
            .await
            .inspect_err(|e| error!(file_name, error = %e, "indexing failed"))?;

        let document = IndexedDocument {
            document_id: Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            raw_text: text,
            encoder_name: options.encoder_name.clone(),
            chunk_size: options.chunk_size,
            chunk_overlap: options.chunk_overlap,
            indexed_at: Utc::now(),
            index,
        };

        info!(
            document.id = %document.document_id,
            file_name,
            encoder = %options.encoder_name,
            chunk_count,
            "indexed document"
        );

        Ok(document)
    }

    /// Return the `top_k` chunks of `document` most similar to `query`.
    ///
    /// The query is embedded with the encoder the document was indexed with.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if `top_k == 0` or the document's encoder
    ///   is no longer registered.
    /// - [`RagError::EmbeddingError`] if the encoder fails or times out.
    /// - [`RagError::ContractViolation`] on a query dimension mismatch.
    pub async fn search(
        &self,
        document: &IndexedDocument,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".to_string()));
        }
        let encoder = self.encoders.get(&document.encoder_name)?;

        let results = self
            .with_timeout(encoder.name(), document.index.query(query, encoder.as_ref(), top_k))
            .await
            .inspect_err(|e| {
                error!(document.id = %document.document_id, error = %e, "search failed");
            })?;

        info!(
            document.id = %document.document_id,
            top_k,
            result_count = results.len(),
            "search completed"
        );

        Ok(results)
    }

    /// Search with the configured default `top_k`.
    pub async fn search_default(
        &self,
        document: &IndexedDocument,
        query: &str,
    ) -> Result<Vec<SearchResult>> {
        self.search(document, query, self.config.top_k).await
    }

    /// Bound `fut` by the configured embedding timeout, if any.
    async fn with_timeout<T>(
        &self,
        provider: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let Some(limit) = self.config.embed_timeout() else {
            return fut.await;
        };
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            error!(provider, timeout_ms = limit.as_millis() as u64, "embedding timed out");
            RagError::EmbeddingError {
                provider: provider.to_string(),
                message: format!("timed out after {limit:?}"),
            }
        })?
    }
}

impl fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("encoders", &self.encoders)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// Every field is optional: the configuration defaults to
/// [`RagConfig::default()`], the encoders to [`EncoderRegistry::default()`],
/// and the splitter to [`UnicodeSentenceSplitter`].
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .encoders(EncoderRegistry::default())
///     .splitter(Arc::new(UnicodeSentenceSplitter))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    encoders: Option<EncoderRegistry>,
    splitter: Option<Arc<dyn SentenceSplitter>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the encoder registry.
    pub fn encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = Some(encoders);
        self
    }

    /// Set the sentence splitter.
    pub fn splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Build the [`RagPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the configured default encoder is
    /// not in the registry.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let encoders = self.encoders.unwrap_or_default();
        if !encoders.contains(&config.encoder_name) {
            return Err(RagError::ConfigError(format!(
                "default encoder '{}' is not registered (available: {})",
                config.encoder_name,
                encoders.names().join(", ")
            )));
        }
        let splitter = self.splitter.unwrap_or_else(|| Arc::new(UnicodeSentenceSplitter));

        Ok(RagPipeline { config, encoders, splitter })
    }
}
