use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use sift_rag::{
    Chunk, DocumentSlot, EncoderRegistry, IndexOptions, RagConfig, RagPipeline, StoredFile,
    TextStorage,
    storage::{decode_text, require_text_extension, validate_file_name},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    error::ApiError,
    extract::{JsonBody, QueryParams},
    protocol::{
        SearchRequest, SearchResponse, StorageLoadRequest, StorageUploadResponse, UploadParams,
        UploadResponse,
    },
};

/// File name used when a multipart upload does not carry one.
pub const DEFAULT_UPLOAD_NAME: &str = "uploaded.txt";
/// Default request body limit for uploads.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub slot: DocumentSlot,
    pub storage: TextStorage,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: RagPipeline, storage: TextStorage) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            slot: DocumentSlot::new(),
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_config(config: &ServerConfig) -> sift_rag::Result<Self> {
        let pipeline = RagPipeline::builder()
            .config(config.rag.clone())
            .encoders(config.encoders.clone())
            .build()?;
        Ok(Self {
            max_upload_bytes: config.max_upload_bytes,
            ..Self::new(pipeline, TextStorage::new(&config.storage_dir))
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub rag: RagConfig,
    pub encoders: EncoderRegistry,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            storage_dir: PathBuf::from("storage"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rag: RagConfig::default(),
            encoders: EncoderRegistry::default(),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload_and_index))
        .route("/api/document/current", get(current_document))
        .route("/api/document/current/chunks", get(current_document_chunks))
        .route("/api/search", post(search_document))
        .route("/api/storage/list", get(storage_list))
        .route("/api/storage/upload", post(upload_to_storage))
        .route("/api/storage/load", post(load_from_storage))
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("invalid pipeline configuration")?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for sift server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        storage_dir = %config.storage_dir.display(),
        encoder = %config.rag.encoder_name,
        "sift listening on http://{}",
        addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok"}))
}

async fn upload_and_index(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let options = params.index_options(state.pipeline.config())?;
    check_options(&state, &options)?;

    let upload = read_text_upload(multipart?).await?;
    state.storage.save(&upload.file_name, &upload.content).await?;
    let text = decode_text(&upload.content);

    index_and_replace(&state, &upload.file_name, text, &options).await
}

async fn current_document(State(state): State<AppState>) -> Result<Json<UploadResponse>, ApiError> {
    let document = state.slot.current().await?;
    Ok(Json(document.summary()))
}

async fn current_document_chunks(
    State(state): State<AppState>,
) -> Result<Json<Vec<Chunk>>, ApiError> {
    let document = state.slot.current().await?;
    Ok(Json(document.chunks().to_vec()))
}

async fn search_document(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let top_k = request.top_k(state.pipeline.config())?;
    let document = state.slot.current().await?;
    let results = state.pipeline.search(&document, &request.query, top_k).await?;
    Ok(Json(SearchResponse { results }))
}

async fn storage_list(State(state): State<AppState>) -> Result<Json<Vec<StoredFile>>, ApiError> {
    Ok(Json(state.storage.list().await?))
}

async fn upload_to_storage(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StorageUploadResponse>, ApiError> {
    let upload = read_text_upload(multipart?).await?;
    let stored = state.storage.save(&upload.file_name, &upload.content).await?;
    info!(file_name = %stored.file_name, size_bytes = stored.size_bytes, "stored upload");

    Ok(Json(StorageUploadResponse {
        file_name: stored.file_name,
        size_bytes: stored.size_bytes,
        stored: true,
    }))
}

async fn load_from_storage(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<StorageLoadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let options = request.index_options(state.pipeline.config())?;
    check_options(&state, &options)?;

    let text = state.storage.read_text(&request.file_name).await?;
    index_and_replace(&state, &request.file_name, text, &options).await
}

/// Reject bad indexing parameters before any file is touched.
fn check_options(state: &AppState, options: &IndexOptions) -> Result<(), ApiError> {
    options.validate()?;
    state.pipeline.encoders().get(&options.encoder_name)?;
    Ok(())
}

async fn index_and_replace(
    state: &AppState,
    file_name: &str,
    text: String,
    options: &IndexOptions,
) -> Result<Json<UploadResponse>, ApiError> {
    let document = state.pipeline.index_document(file_name, text, options).await?;
    let document = state.slot.replace(document).await;
    Ok(Json(document.summary()))
}

struct TextUpload {
    file_name: String,
    content: Vec<u8>,
}

/// Read the `file` field of a multipart body, enforcing the plain-text rules.
async fn read_text_upload(mut multipart: Multipart) -> Result<TextUpload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !is_plain_text(content_type) {
                return Err(sift_rag::RagError::InvalidInput(format!(
                    "only .txt files are supported, got content type '{content_type}'"
                ))
                .into());
            }
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        validate_file_name(&file_name)?;
        require_text_extension(&file_name)?;

        let content = field.bytes().await?.to_vec();
        return Ok(TextUpload { file_name, content });
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}

fn is_plain_text(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/plain"))
}
