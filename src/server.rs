use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    backend::{
        local::{LocalEngineConfig, ModelLoader},
        proxy::ProxyConfig,
        GroundingBackend, LocalEngine, ProxyBackend,
    },
    config::{ServerConfig, ServingMode},
    parsers::BoxTokens,
    routers,
};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn GroundingBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn GroundingBackend>) -> Self {
        Self { backend }
    }
}

pub fn build_app(state: AppState, max_payload_size: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routers::health::health))
        .route("/v1/chat/completions", post(routers::chat::chat_completions))
        .route("/grounding/generate", post(routers::grounding::generate))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_payload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Model loaders compiled into this binary. None ship by default; embedders
/// pass their own to [`build_backend`].
pub fn default_loaders() -> Vec<Box<dyn ModelLoader>> {
    Vec::new()
}

/// Construct the backend for the configured serving mode.
///
/// Direct mode runs the loader cascade on a blocking thread. A failed load is
/// logged and the server still starts, reporting itself as degraded.
pub async fn build_backend(
    config: &ServerConfig,
    loaders: Vec<Box<dyn ModelLoader>>,
) -> anyhow::Result<Arc<dyn GroundingBackend>> {
    let backend: Arc<dyn GroundingBackend> = match config.mode {
        ServingMode::Proxy => Arc::new(ProxyBackend::new(ProxyConfig {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
            default_max_tokens: config.max_tokens,
            box_tokens: BoxTokens::default(),
        })),
        ServingMode::Direct => {
            let engine_config = LocalEngineConfig {
                model_id: config.model.clone(),
                device: config.device.clone(),
                default_max_tokens: config.max_tokens,
            };
            let engine =
                tokio::task::spawn_blocking(move || LocalEngine::load(engine_config, &loaders))
                    .await?;
            if !engine.is_loaded() {
                warn!("Serving without a model; generation requests will fail");
            }
            Arc::new(engine)
        }
    };
    Ok(backend)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let backend = build_backend(&config, default_loaders()).await?;
    let app = build_app(AppState::new(backend), config.max_payload_size);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        mode = config.mode.as_str(),
        model = %config.model,
        "Grounding server listening on http://{}",
        listener.local_addr()?
    );
    info!("  GET  /health");
    info!("  POST /v1/chat/completions");
    info!("  POST /grounding/generate");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
