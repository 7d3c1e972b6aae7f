//! In-memory similarity index over one document's chunk embeddings.
//!
//! [`SimilarityIndex`] holds the chunks of a single document together with one
//! unit-length embedding per chunk, and answers exact top-k queries by dot
//! product. There is no approximate structure: every query scores every chunk.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, error};

use crate::document::{Chunk, SearchResult};
use crate::embedding::{EmbeddingProvider, dot, normalize};
use crate::error::{RagError, Result};

/// Chunks of one document and their embeddings, in matching order.
///
/// Embedding `i` always belongs to chunk `i`. The index is never empty.
///
/// # Example
///
/// ```rust,ignore
/// use sift_rag::SimilarityIndex;
///
/// let index = SimilarityIndex::build(chunks, &encoder).await?;
/// let results = index.query("how do I configure X?", &encoder, 3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
}

impl SimilarityIndex {
    /// Embed `chunks` with a single batch call and index the result.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyContent`] if `chunks` is empty.
    /// - [`RagError::ContractViolation`] if the provider returns a different
    ///   number of vectors than chunks, or vectors of inconsistent size.
    /// - Any error returned by the provider.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::EmptyContent("cannot index zero chunks".to_string()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        debug!(provider = embedder.name(), chunk_count = texts.len(), "embedding chunks");
        let embeddings = embedder.embed_batch(&texts).await?;

        Self::from_parts(chunks, embeddings)
    }

    /// Index precomputed embeddings. Vectors are L2-normalized on the way in.
    ///
    /// Chunk ids must equal their positions, as [`Chunker`](crate::Chunker)
    /// assigns them.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if a chunk's id differs from its position.
    /// - Otherwise the same as [`build`](Self::build), minus provider errors.
    pub fn from_parts(chunks: Vec<Chunk>, mut embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::EmptyContent("cannot index zero chunks".to_string()));
        }
        if let Some((pos, chunk)) = chunks.iter().enumerate().find(|(i, c)| c.chunk_id != *i) {
            return Err(RagError::InvalidInput(format!(
                "chunk at position {pos} has chunk_id {}",
                chunk.chunk_id
            )));
        }
        if embeddings.len() != chunks.len() {
            error!(
                chunk_count = chunks.len(),
                embedding_count = embeddings.len(),
                "embedding count does not match chunk count"
            );
            return Err(RagError::embedding_contract(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(RagError::embedding_contract("embeddings must not be empty"));
        }
        if let Some(pos) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(RagError::embedding_contract(format!(
                "embedding {pos} has {} dimensions, expected {dimensions}",
                embeddings[pos].len()
            )));
        }

        for embedding in &mut embeddings {
            normalize(embedding);
        }

        Ok(Self { chunks, embeddings, dimensions })
    }

    /// Embed `query_text` and return the `top_k` most similar chunks.
    ///
    /// # Errors
    ///
    /// See [`search_vector`](Self::search_vector); provider errors are propagated.
    pub async fn query(
        &self,
        query_text: &str,
        embedder: &dyn EmbeddingProvider,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".to_string()));
        }
        let query_vector = embedder.embed(query_text).await?;
        self.search_vector(&query_vector, top_k)
    }

    /// Return the `min(top_k, len)` chunks most similar to `query_vector`.
    ///
    /// Results are ordered by descending score; equal scores are ordered by
    /// ascending `chunk_id`. The query vector is normalized before scoring.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if `top_k == 0`.
    /// - [`RagError::ContractViolation`] if the query dimensionality differs
    ///   from the indexed embeddings.
    pub fn search_vector(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::InvalidInput("top_k must be at least 1".to_string()));
        }
        if query_vector.len() != self.dimensions {
            error!(
                expected = self.dimensions,
                actual = query_vector.len(),
                "query embedding dimension mismatch"
            );
            return Err(RagError::embedding_contract(format!(
                "query has {} dimensions, index has {}",
                query_vector.len(),
                self.dimensions
            )));
        }

        let mut query = query_vector.to_vec();
        normalize(&mut query);

        let k = top_k.min(self.chunks.len());
        // Min-heap over the best k seen so far; the root is the weakest keeper.
        let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
        for (chunk_id, embedding) in self.embeddings.iter().enumerate() {
            // `+ 0.0` folds -0.0 into +0.0 so it ties by chunk id.
            let score = dot(embedding, &query) + 0.0;
            heap.push(Reverse(Ranked { score, chunk_id }));
            if heap.len() > k {
                heap.pop();
            }
        }

        // Ascending order of `Reverse<Ranked>` is best-first.
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(ranked)| SearchResult {
                chunk_id: ranked.chunk_id,
                score: ranked.score,
                text: self.chunks[ranked.chunk_id].text.clone(),
            })
            .collect())
    }

    /// The indexed chunks in order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The stored unit-length embeddings, one per chunk.
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always `false`; kept alongside [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// A scored chunk ordered by relevance: higher score first, then lower id.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    score: f32,
    chunk_id: usize,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    /// `a > b` means `a` is more relevant than `b`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.chunk_id.cmp(&self.chunk_id))
    }
}
