//! RemoteOK scraper — public JSON API, no auth required.

use async_trait::async_trait;
use serde_json::Value;

use crate::scrape::{Fetcher, JobSource, RawJob, ScrapeError};

const API_URL: &str = "https://remoteok.com/api";

pub struct RemoteOkScraper {
    fetcher: Fetcher,
}

impl RemoteOkScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl JobSource for RemoteOkScraper {
    fn name(&self) -> &'static str {
        "remoteok"
    }

    async fn fetch(&self, search_terms: &[String]) -> Result<Vec<RawJob>, ScrapeError> {
        // The API returns a JSON array; the first element is a legal notice
        // without an id, which the id filter drops.
        let entries: Vec<Value> = self.fetcher.get_json(API_URL).await?;

        Ok(entries
            .iter()
            .filter(|entry| entry.get("id").map(|id| !id.is_null()).unwrap_or(false))
            .filter(|entry| matches_terms(entry, search_terms))
            .map(to_raw_job)
            .collect())
    }
}

fn matches_terms(entry: &Value, search_terms: &[String]) -> bool {
    if search_terms.is_empty() {
        return true;
    }
    let position = str_field(entry, "position").to_lowercase();
    let description = str_field(entry, "description").to_lowercase();
    search_terms.iter().any(|term| {
        let term = term.to_lowercase();
        position.contains(&term) || description.contains(&term)
    })
}

fn to_raw_job(entry: &Value) -> RawJob {
    let id = entry
        .get("id")
        .map(|v| v.to_string().trim_matches('"').to_string())
        .unwrap_or_default();
    let source_url = match str_field(entry, "url") {
        "" => format!("https://remoteok.com/remote-jobs/{id}"),
        url => url.to_string(),
    };

    RawJob {
        title: str_field(entry, "position").to_string(),
        company: str_field(entry, "company").to_string(),
        location: "Remote".to_string(),
        description: str_field(entry, "description").to_string(),
        source_url,
        salary: str_field(entry, "salary").to_string(),
        posted_at: entry
            .get("date")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        tags: entry
            .get("tags")
            .and_then(|v| v.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        extra: Value::Null,
    }
}

fn str_field<'a>(entry: &'a Value, key: &str) -> &'a str {
    entry.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
