//! HTTP error mapping.
//!
//! Every failed request is answered with a JSON body of the form
//! `{"detail": "..."}` and a status code derived from the error kind.

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sift_rag::RagError;
use thiserror::Error;
use tracing::{debug, error};

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rag(#[from] RagError),

    /// The multipart body could not be read.
    #[error("Malformed upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    /// The JSON body is missing, unparsable, or has the wrong shape.
    #[error("Invalid JSON body: {}", .0.body_text())]
    JsonBody(#[from] JsonRejection),

    #[error("Invalid query string: {}", .0.body_text())]
    Query(#[from] QueryRejection),

    /// The request is not a readable `multipart/form-data` body.
    #[error("Invalid multipart request: {}", .0.body_text())]
    MultipartBody(#[from] MultipartRejection),

    /// The request is well-formed but lacks a required part.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rag(err) => rag_status(err),
            ApiError::Multipart(err) => err.status(),
            ApiError::JsonBody(err) => client_status(err.status()),
            ApiError::Query(err) => client_status(err.status()),
            ApiError::MultipartBody(err) => client_status(err.status()),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Shape errors are invalid input like any other, so 422 is reported as 400.
fn client_status(status: StatusCode) -> StatusCode {
    if status == StatusCode::UNPROCESSABLE_ENTITY { StatusCode::BAD_REQUEST } else { status }
}

fn rag_status(err: &RagError) -> StatusCode {
    match err {
        RagError::InvalidInput(_) | RagError::EmptyContent(_) => StatusCode::BAD_REQUEST,
        RagError::NotFound(_) => StatusCode::NOT_FOUND,
        RagError::EmbeddingError { .. } => StatusCode::BAD_GATEWAY,
        RagError::ContractViolation { .. }
        | RagError::StorageError { .. }
        | RagError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), %detail, "request failed");
        } else {
            debug!(status = status.as_u16(), %detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}
