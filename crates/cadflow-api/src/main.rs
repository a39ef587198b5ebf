//! Binary entrypoint for the CADFLOW API server.
use cadflow_api::{build_state, config::ApiConfig, run};
use cadflow_llm::OpenAIConfig;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "cadflow=info,tower_http=info";

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

#[tokio::main]
async fn main() {
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(false);
            error!("{}", e);
            std::process::exit(1);
        }
    };
    init_logging(config.log_json);

    let llm = match OpenAIConfig::from_env() {
        Ok(llm) => llm,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = match build_state(&config, llm) {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config, state).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
