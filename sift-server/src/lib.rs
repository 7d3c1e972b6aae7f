//! `sift-server` exposes the `sift-rag` pipeline over HTTP: upload a plain-text
//! document, index it with a named encoder, and search the current document.

pub mod error;
pub mod extract;
pub mod protocol;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use server::{AppState, ServerConfig, app_router, run_server};
