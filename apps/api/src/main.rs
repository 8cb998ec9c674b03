mod admin;
mod advisor;
mod auth;
mod config;
mod db;
mod embeddings;
mod errors;
mod heuristics;
mod jobs;
mod llm_client;
mod models;
mod recommend;
mod resume;
mod routes;
mod scrape;
mod skill_gap;
mod skills;
mod state;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::create_pool;
use crate::embeddings::EmbeddingsClient;
use crate::heuristics::Heuristics;
use crate::llm_client::LlmClient;
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

    info!("Starting job recommender API v{}", env!("CARGO_PKG_VERSION"));

    // Heuristic tables (built-in defaults unless HEURISTICS_PATH overrides)
    let heuristics = Arc::new(Heuristics::load(config.heuristics_path.as_deref())?);
    info!(
        "Heuristics loaded: {} vocabulary terms, {} aliases",
        heuristics.skills.vocabulary.len(),
        heuristics.skills.aliases.len()
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize AI clients
    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());

    let embeddings = EmbeddingsClient::new(
        config.embeddings_api_url.clone(),
        config.llm_api_key.clone(),
        config.embeddings_model.clone(),
        config.embedding_dimension,
    );
    info!(
        "Embeddings client initialized (dimension: {})",
        embeddings.dimension()
    );

    // Token issuer for bearer auth
    let tokens = TokenIssuer::new(&config.jwt_secret, config.token_expiry_minutes);

    // Build app state
    let state = AppState {
        db,
        redis,
        llm,
        embeddings,
        tokens,
        heuristics,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
