//! Embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! Works with the OpenAI API itself and with self-hosted servers that speak
//! the same protocol (text-embeddings-inference, infinity, vLLM, ...), which
//! is how sentence-transformer models are typically served next to this crate.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingProvider, normalize};
use crate::error::{RagError, Result};

/// The default API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// Returned vectors are L2-normalized and reordered by the `index` field of
/// the response, so ordering holds even for servers that answer out of order.
///
/// # Configuration
///
/// - `base_url` – defaults to [`OPENAI_BASE_URL`]; `/embeddings` is appended.
/// - `model` – the model identifier sent with each request.
/// - `dimensions` – the expected output size; mismatches are reported as
///   [`RagError::ContractViolation`].
/// - `api_key` – optional bearer token.
///
/// # Example
///
/// ```rust,ignore
/// use sift_rag::openai::OpenAiCompatibleEmbeddingProvider;
///
/// let provider = OpenAiCompatibleEmbeddingProvider::new("sergeyzh/rubert-mini-sts", 312)
///     .with_base_url("http://localhost:8080/v1");
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAiCompatibleEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl OpenAiCompatibleEmbeddingProvider {
    /// Create a provider for `model`, which produces `dimensions`-sized vectors.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: model.into(),
            dimensions,
        }
    }

    /// Set the API base URL (without the `/embeddings` suffix).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send `api_key` as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    fn embedding_error(&self, message: String) -> RagError {
        RagError::EmbeddingError { provider: self.model.clone(), message }
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    /// Position of the matching input. Servers that omit it answer in order.
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Place each returned vector at its input position and normalize it.
///
/// Every input position must be covered exactly once and every vector must
/// have `dimensions` entries.
fn order_embeddings(
    model: &str,
    data: Vec<EmbeddingData>,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(RagError::embedding_contract(format!(
            "{model} returned {} embeddings for {expected} inputs",
            data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, item) in data.into_iter().enumerate() {
        let index = item.index.unwrap_or(position);
        if index >= expected {
            return Err(RagError::embedding_contract(format!(
                "{model} returned index {index} for {expected} inputs"
            )));
        }
        if item.embedding.len() != dimensions {
            return Err(RagError::embedding_contract(format!(
                "{model} returned {} dimensions, expected {dimensions}",
                item.embedding.len()
            )));
        }
        if slots[index].is_some() {
            return Err(RagError::embedding_contract(format!(
                "{model} returned index {index} more than once"
            )));
        }
        let mut embedding = item.embedding;
        normalize(&mut embedding);
        slots[index] = Some(embedding);
    }

    // Equal counts and no duplicates leave no slot empty.
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                RagError::embedding_contract(format!("{model} returned no embedding for {index}"))
            })
        })
        .collect()
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = %self.model, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| {
            RagError::embedding_contract(format!("{} returned no embedding", self.model))
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = %self.model, batch_size = texts.len(), "embedding batch");

        let url = format!("{}/embeddings", self.base_url);
        let mut request =
            self.client.post(&url).json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = %self.model, error = %e, "request failed");
            self.embedding_error(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = %self.model, %status, "API error");
            return Err(self.embedding_error(format!("API returned {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = %self.model, error = %e, "failed to parse response");
            self.embedding_error(format!("failed to parse response: {e}"))
        })?;

        order_embeddings(&self.model, parsed.data, texts.len(), self.dimensions)
            .inspect_err(|e| error!(provider = %self.model, error = %e, "malformed response"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(json: &str) -> Vec<EmbeddingData> {
        serde_json::from_str::<EmbeddingResponse>(json).unwrap().data
    }

    #[test]
    fn reordered_response_is_restored_to_input_order() {
        let response = data(
            r#"{"data": [
                {"index": 1, "embedding": [0.0, 2.0]},
                {"index": 0, "embedding": [3.0, 4.0]}
            ]}"#,
        );
        let embeddings = order_embeddings("m", response, 2, 2).unwrap();
        assert_eq!(embeddings, vec![vec![0.6, 0.8], vec![0.0, 1.0]]);
    }

    #[test]
    fn missing_indices_keep_response_order() {
        let response = data(r#"{"data": [{"embedding": [1.0, 0.0]}, {"embedding": [0.0, 5.0]}]}"#);
        let embeddings = order_embeddings("m", response, 2, 2).unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_count_is_contract_violation() {
        let response = data(r#"{"data": [{"index": 0, "embedding": [1.0, 0.0]}]}"#);
        let err = order_embeddings("m", response, 2, 2).unwrap_err();
        assert!(matches!(err, RagError::ContractViolation { ref message, .. }
            if message.contains("1 embeddings for 2 inputs")));
    }

    #[test]
    fn wrong_dimension_is_contract_violation() {
        let response = data(r#"{"data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]}"#);
        let err = order_embeddings("m", response, 1, 2).unwrap_err();
        assert!(matches!(err, RagError::ContractViolation { ref message, .. }
            if message.contains("3 dimensions")));
    }

    #[test]
    fn repeated_index_is_contract_violation() {
        let response = data(
            r#"{"data": [
                {"index": 0, "embedding": [1.0, 0.0]},
                {"index": 0, "embedding": [0.0, 1.0]}
            ]}"#,
        );
        let err = order_embeddings("m", response, 2, 2).unwrap_err();
        assert!(matches!(err, RagError::ContractViolation { ref message, .. }
            if message.contains("more than once")));
    }

    #[test]
    fn out_of_range_index_is_contract_violation() {
        let response = data(
            r#"{"data": [
                {"index": 0, "embedding": [1.0, 0.0]},
                {"index": 2, "embedding": [0.0, 1.0]}
            ]}"#,
        );
        let err = order_embeddings("m", response, 2, 2).unwrap_err();
        assert!(matches!(err, RagError::ContractViolation { ref message, .. }
            if message.contains("index 2")));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let provider = OpenAiCompatibleEmbeddingProvider::new("text-embedding-3-small", 1536)
            .with_base_url("http://127.0.0.1:9");
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
        assert_eq!(provider.name(), "text-embedding-3-small");
        assert_eq!(provider.dimensions(), 1536);
    }
}
