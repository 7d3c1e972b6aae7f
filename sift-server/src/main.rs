use std::{path::PathBuf, time::Duration};

use clap::Parser;
use sift_rag::{
    EncoderRegistry, RagConfig,
    config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_ENCODER, DEFAULT_TOP_K},
};
use sift_server::server::{DEFAULT_MAX_UPLOAD_BYTES, ServerConfig, run_server};
use tracing_subscriber::EnvFilter;

/// Upload, index, and search plain-text documents over HTTP.
#[derive(Debug, Parser)]
#[command(name = "sift-server", version, about)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "SIFT_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, env = "SIFT_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory holding uploaded .txt files
    #[arg(long, env = "SIFT_STORAGE_DIR", default_value = "storage")]
    storage_dir: PathBuf,

    /// Maximum request body size for uploads
    #[arg(long, env = "SIFT_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Default chunk size in characters
    #[arg(long, env = "SIFT_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Default chunk overlap in characters
    #[arg(long, env = "SIFT_CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Default number of search results
    #[arg(long, env = "SIFT_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Default encoder variant
    #[arg(long, env = "SIFT_ENCODER", default_value = DEFAULT_ENCODER)]
    encoder: String,

    /// Upper bound on a single embedding call
    #[arg(long, env = "SIFT_EMBED_TIMEOUT_MS")]
    embed_timeout_ms: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, env = "SIFT_LOG_JSON")]
    log_json: bool,

    /// Register a remote OpenAI-compatible encoder under this variant name
    #[cfg(feature = "openai")]
    #[arg(long, env = "SIFT_OPENAI_ENCODER", requires = "openai_model")]
    openai_encoder: Option<String>,

    #[cfg(feature = "openai")]
    #[arg(long, env = "SIFT_OPENAI_MODEL", requires = "openai_dimensions")]
    openai_model: Option<String>,

    #[cfg(feature = "openai")]
    #[arg(long, env = "SIFT_OPENAI_DIMENSIONS")]
    openai_dimensions: Option<usize>,

    #[cfg(feature = "openai")]
    #[arg(long, env = "SIFT_OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    #[cfg(feature = "openai")]
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
}

impl Cli {
    fn rag_config(&self) -> sift_rag::Result<RagConfig> {
        let mut builder = RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .encoder_name(&self.encoder);
        if let Some(ms) = self.embed_timeout_ms {
            builder = builder.embed_timeout(Duration::from_millis(ms));
        }
        builder.build()
    }

    #[cfg(not(feature = "openai"))]
    fn encoders(&self) -> EncoderRegistry {
        EncoderRegistry::default()
    }

    #[cfg(feature = "openai")]
    fn encoders(&self) -> EncoderRegistry {
        use std::sync::Arc;

        use sift_rag::openai::OpenAiCompatibleEmbeddingProvider;

        let registry = EncoderRegistry::default();
        let (Some(name), Some(model), Some(dimensions)) =
            (&self.openai_encoder, &self.openai_model, self.openai_dimensions)
        else {
            return registry;
        };

        let mut provider = OpenAiCompatibleEmbeddingProvider::new(model, dimensions);
        if let Some(base_url) = &self.openai_base_url {
            provider = provider.with_base_url(base_url);
        }
        if let Some(api_key) = &self.openai_api_key {
            provider = provider.with_api_key(api_key);
        }
        registry.register(name, Arc::new(provider))
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        storage_dir: cli.storage_dir.clone(),
        max_upload_bytes: cli.max_upload_bytes,
        rag: cli.rag_config()?,
        encoders: cli.encoders(),
    };

    run_server(config).await
}
