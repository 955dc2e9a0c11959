mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod models;
mod profile;
mod progress;
mod roadmap;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::interview::feedback::{CannedFeedbackGenerator, FeedbackGenerator, LlmFeedbackGenerator};
use crate::llm_client::LlmClient;
use crate::progress::service::ProgressService;
use crate::progress::pg::PgProgressStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PrepScore API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let progress = ProgressService::new(Arc::new(PgProgressStore::new(db)));

    // Interview feedback: LLM when a key is configured, canned otherwise
    let feedback: Arc<dyn FeedbackGenerator> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmFeedbackGenerator(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set, interview feedback will use the canned fallback");
            Arc::new(CannedFeedbackGenerator)
        }
    };

    let state = AppState {
        progress,
        feedback,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        // TODO: restrict allowed origins once the web client's domain is fixed
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
