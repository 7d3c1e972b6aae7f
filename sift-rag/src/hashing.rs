//! Deterministic feature-hashing encoder.
//!
//! [`HashingEmbeddingProvider`] needs no model weights and no network: each
//! lower-cased word and each of its character trigrams is hashed into a signed
//! bucket, and the bucket vector is L2-normalized. Texts sharing vocabulary end
//! up close in cosine space, which is enough for lexical retrieval, demos, and
//! tests.

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::{EmbeddingProvider, normalize};
use crate::error::Result;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a character trigram relative to a whole word.
const TRIGRAM_WEIGHT: f32 = 0.5;

/// An [`EmbeddingProvider`] that embeds text by hashing words and trigrams.
///
/// Output is a pure function of the input text and the dimensionality. Text
/// without any alphanumeric character embeds to the zero vector.
///
/// # Example
///
/// ```rust,ignore
/// use sift_rag::HashingEmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::new("mini", 312);
/// let v = provider.embed("Rust is fast").await?;
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    name: String,
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing `dimensions`-sized vectors (at least one).
    pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
        Self { name: name.into(), dimensions: dimensions.max(1) }
    }

    /// Embed synchronously. Used by both trait methods.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];

        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let word = word.to_lowercase();
            self.add_feature(&mut v, word.as_bytes(), 1.0);

            let padded: Vec<char> = format!("^{word}$").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut v, gram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        normalize(&mut v);
        v
    }

    fn add_feature(&self, v: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign * weight;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = %self.name, text_len = text.len(), "embedding single text");
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(provider = %self.name, batch_size = texts.len(), "embedding batch");
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::dot;

    #[test]
    fn embeddings_are_unit_length_and_sized() {
        let provider = HashingEmbeddingProvider::new("mini", 312);
        let v = provider.embed_text("Memory safety without garbage collection.");
        assert_eq!(v.len(), 312);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn embedding_is_deterministic_and_case_insensitive() {
        let provider = HashingEmbeddingProvider::new("mini", 64);
        assert_eq!(provider.embed_text("Tokio Runtime"), provider.embed_text("tokio runtime"));
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let provider = HashingEmbeddingProvider::new("labse", 768);
        let query = provider.embed_text("async runtime");
        let related = provider.embed_text("Tokio is the most popular async runtime.");
        let unrelated = provider.embed_text("Bake the bread at two hundred degrees.");
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn punctuation_only_text_embeds_to_zero() {
        let provider = HashingEmbeddingProvider::new("mini", 8);
        assert!(provider.embed_text("... !?").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn batch_matches_single_embeddings() {
        let provider = HashingEmbeddingProvider::new("mini", 32);
        let batch = provider.embed_batch(&["one", "two"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], provider.embed("two").await.unwrap());
        assert_eq!(provider.name(), "mini");
    }
}
