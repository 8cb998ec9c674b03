use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::embeddings::EmbeddingsClient;
use crate::heuristics::Heuristics;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. Collaborators are constructed once in `main` — no module
/// holds process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis client reserved for the scheduled scrape queue.
    #[allow(dead_code)]
    pub redis: RedisClient,
    pub llm: LlmClient,
    pub embeddings: EmbeddingsClient,
    pub tokens: TokenIssuer,
    /// Scoring thresholds and skill tables, loaded at startup.
    pub heuristics: Arc<Heuristics>,
    pub config: Config,
}
