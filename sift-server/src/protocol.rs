//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use sift_rag::{DocumentSummary, IndexOptions, RagConfig, RagError, SearchResult};

/// Returned after a document has been indexed and made current.
pub type UploadResponse = DocumentSummary;

/// Query parameters of `POST /api/upload`.
///
/// Sizes are signed so that negative values reach validation and are reported
/// as invalid input instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadParams {
    pub encoder_name: Option<String>,
    pub chunk_size: Option<i64>,
    pub chunk_overlap: Option<i64>,
}

impl UploadParams {
    /// Resolve the parameters against the configured defaults.
    pub fn index_options(&self, defaults: &RagConfig) -> Result<IndexOptions, RagError> {
        index_options(
            self.encoder_name.as_deref(),
            self.chunk_size,
            self.chunk_overlap,
            defaults,
        )
    }
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
}

impl SearchRequest {
    /// The requested result count, or the configured default.
    pub fn top_k(&self, defaults: &RagConfig) -> Result<usize, RagError> {
        match self.top_k {
            None => Ok(defaults.top_k),
            Some(k) if k >= 1 => usize::try_from(k).map_err(|_| top_k_error(k)),
            Some(k) => Err(top_k_error(k)),
        }
    }
}

fn top_k_error(k: i64) -> RagError {
    RagError::InvalidInput(format!("top_k must be at least 1, got {k}"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageUploadResponse {
    pub file_name: String,
    pub size_bytes: u64,
    pub stored: bool,
}

/// Body of `POST /api/storage/load`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLoadRequest {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<i64>,
}

impl StorageLoadRequest {
    pub fn index_options(&self, defaults: &RagConfig) -> Result<IndexOptions, RagError> {
        index_options(
            self.encoder_name.as_deref(),
            self.chunk_size,
            self.chunk_overlap,
            defaults,
        )
    }
}

fn index_options(
    encoder_name: Option<&str>,
    chunk_size: Option<i64>,
    chunk_overlap: Option<i64>,
    defaults: &RagConfig,
) -> Result<IndexOptions, RagError> {
    let chunk_size = match chunk_size {
        None => defaults.chunk_size,
        Some(size) if size > 0 => to_usize("chunk_size", size)?,
        Some(size) => {
            return Err(RagError::InvalidInput(format!(
                "chunk_size must be greater than zero, got {size}"
            )));
        }
    };
    let chunk_overlap = match chunk_overlap {
        None => defaults.chunk_overlap,
        Some(overlap) if overlap >= 0 => to_usize("chunk_overlap", overlap)?,
        Some(overlap) => {
            return Err(RagError::InvalidInput(format!(
                "chunk_overlap must not be negative, got {overlap}"
            )));
        }
    };

    Ok(IndexOptions {
        encoder_name: encoder_name.unwrap_or(&defaults.encoder_name).to_string(),
        chunk_size,
        chunk_overlap,
    })
}

fn to_usize(field: &str, value: i64) -> Result<usize, RagError> {
    usize::try_from(value)
        .map_err(|_| RagError::InvalidInput(format!("{field} is out of range: {value}")))
}
