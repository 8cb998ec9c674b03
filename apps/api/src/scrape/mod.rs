//! Job scraping — three sources behind one trait, sharing a rate-gated
//! HTTP fetcher. Sources run sequentially on manual trigger; normalization
//! and persistence live in `normalize` and `ingest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod board;
pub mod feeds;
pub mod ingest;
pub mod normalize;
pub mod remoteok;

/// Sources accepted by the manual scrape trigger.
pub const VALID_SOURCES: &[&str] = &["board", "remoteok", "rss"];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed (status {status}) for {url}")]
    Status { status: u16, url: String },

    #[error("feed parse error: {0}")]
    Feed(#[from] rss::Error),
}

/// One raw posting as a source produced it, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub source_url: String,
    /// Free-text salary as advertised, if the source carries one.
    pub salary: String,
    /// Publication date string in whatever format the source uses.
    pub posted_at: Option<String>,
    pub tags: Vec<String>,
    /// Source-specific leftovers, kept in job_metadata.
    pub extra: Value,
}

/// Enforces a fixed minimum delay between outbound requests per scraper
/// instance.
pub struct RateGate {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        Self {
            min_delay: Duration::from_secs_f64(60.0 / requests_per_minute as f64),
            last_request: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Rate-gated HTTP fetcher shared by all sources.
pub struct Fetcher {
    client: reqwest::Client,
    gate: RateGate,
}

impl Fetcher {
    pub fn new(user_agent: &str, requests_per_minute: u32) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            gate: RateGate::new(requests_per_minute),
        }
    }

    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let response = self.get(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScrapeError> {
        let response = self.get(url).await?;
        Ok(response.json().await?)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ScrapeError> {
        self.gate.wait().await;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// A scraping source. Implementations return raw postings; they never touch
/// the database.
#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, search_terms: &[String]) -> Result<Vec<RawJob>, ScrapeError>;
}

/// Builds the source named by the admin trigger. Returns `None` for an
/// unknown source name.
pub fn source_for(name: &str, fetcher: Fetcher) -> Option<Box<dyn JobSource>> {
    match name {
        "board" => Some(Box::new(board::BoardScraper::new(fetcher))),
        "remoteok" => Some(Box::new(remoteok::RemoteOkScraper::new(fetcher))),
        "rss" => Some(Box::new(feeds::FeedScraper::new(fetcher))),
        _ => None,
    }
}
