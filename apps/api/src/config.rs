use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub embeddings_api_url: String,
    pub embeddings_model: String,
    pub embedding_dimension: usize,
    pub scrape_rate_limit_per_minute: u32,
    pub scrape_user_agent: String,
    /// Optional TOML file overriding the built-in scoring/skill tables.
    pub heuristics_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            token_expiry_minutes: parse_env("TOKEN_EXPIRY_MINUTES", 30)?,
            llm_api_url: require_env("LLM_API_URL")?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_model: require_env("LLM_MODEL")?,
            embeddings_api_url: require_env("EMBEDDINGS_API_URL")?,
            embeddings_model: require_env("EMBEDDINGS_MODEL")?,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", 1536)?,
            scrape_rate_limit_per_minute: parse_env("SCRAPE_RATE_LIMIT_PER_MINUTE", 10)?,
            scrape_user_agent: std::env::var("SCRAPE_USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
            }),
            heuristics_path: std::env::var("HEURISTICS_PATH").ok().map(PathBuf::from),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid value")),
        Err(_) => Ok(default),
    }
}
