//! CADFLOW API: HTTP front end for the CAD analysis pipeline
//!
//! ```text
//! POST /api/analyze   JSON | multipart | urlencoded → ResultRecord
//! GET  /api/health
//! GET  /api/pipeline
//! GET  /metrics
//! ```
pub mod config;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod metrics;
pub mod middleware;
pub mod relay;

use axum::{
    routing::{get, post},
    Router,
};
use cadflow_core::{CadAnalyzer, Verifier};
use cadflow_llm::{BackendError, OpenAICompatibleClient, OpenAIConfig};
use cadflow_prompts::{default_renderer, PromptError, PromptGenerator, PromptRenderer};
use cadflow_stages::DefinitionError;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::ApiConfig;
use metrics::Metrics;
use relay::{EchoVerifier, HttpVerifier};

/// Response header carrying the run's trace id
pub const TRACE_HEADER: &str = "x-cadflow-trace-id";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<CadAnalyzer>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(analyzer: CadAnalyzer) -> Result<Self, prometheus::Error> {
        Ok(Self {
            analyzer: Arc::new(analyzer),
            metrics: Arc::new(Metrics::new()?),
        })
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("LLM backend: {0}")]
    Backend(#[from] BackendError),
    #[error("prompts: {0}")]
    Prompts(#[from] PromptError),
    #[error("pipeline: {0}")]
    Pipeline(#[from] DefinitionError),
    #[error("verifier: {0}")]
    Verifier(String),
    #[error("metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("server: {0}")]
    Io(#[from] std::io::Error),
}

pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/health", get(handlers::health))
        .route("/api/pipeline", get(handlers::pipeline))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::upload_limit(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
        .with_state(state)
}

/// Wire pipeline, prompts, LLM client and verifier from configuration.
pub fn build_state(config: &ApiConfig, llm: OpenAIConfig) -> Result<AppState, StartupError> {
    let pipeline = cadflow_stages::resolve(&config.pipeline)?;

    let renderer = match &config.prompts_path {
        Some(path) => PromptRenderer::load(path)?,
        None => default_renderer()?,
    };
    info!(templates = ?renderer.list_templates(), "Prompts loaded");
    for stage in pipeline.stages() {
        if !renderer.has_template(&stage.template_id) {
            return Err(PromptError::UnknownTemplate(stage.template_id.clone()).into());
        }
    }

    info!(model = %llm.model, endpoint = %llm.endpoint, "Using LLM backend");
    let client = Arc::new(OpenAICompatibleClient::new(llm)?);
    let generator = PromptGenerator::new(renderer, client).with_temperature(config.temperature);

    let verifier: Arc<dyn Verifier> = match &config.vlm_url {
        Some(url) => {
            info!(url = %url, "Confirmations relayed to VLM service");
            Arc::new(
                HttpVerifier::new(url.clone(), config.vlm_timeout)
                    .map_err(|e| StartupError::Verifier(e.to_string()))?,
            )
        }
        None => {
            info!("CADFLOW_VLM_URL not set, confirmations are echoed");
            Arc::new(EchoVerifier)
        }
    };

    info!(
        pipeline = %pipeline.name(),
        stages = %pipeline.pipeline_id(),
        "Pipeline loaded"
    );
    let analyzer = CadAnalyzer::new(pipeline, Arc::new(generator), verifier);
    Ok(AppState::new(analyzer)?)
}

pub async fn run(config: ApiConfig, state: AppState) -> Result<(), StartupError> {
    let app = create_app(state, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    info!("CADFLOW API listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
