//! RSS feed scraper — fixed feed list, entries filtered by search terms.

use async_trait::async_trait;
use rss::Channel;
use serde_json::Value;
use tracing::warn;

use crate::scrape::{Fetcher, JobSource, RawJob, ScrapeError};

/// Job-board feeds polled on each run. Per-feed failures are logged and the
/// remaining feeds still run.
const RSS_FEEDS: &[&str] = &[
    "https://weworkremotely.com/categories/remote-programming-jobs.rss",
    "https://remotive.com/remote-jobs/feed/software-dev",
];

pub struct FeedScraper {
    fetcher: Fetcher,
}

impl FeedScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn fetch_feed(&self, feed_url: &str, search_terms: &[String]) -> Result<Vec<RawJob>, ScrapeError> {
        let bytes = self.fetcher.get_bytes(feed_url).await?;
        let channel = Channel::read_from(&bytes[..])?;

        Ok(channel
            .items()
            .iter()
            .filter(|item| matches_terms(item, search_terms))
            .map(to_raw_job)
            .collect())
    }
}

#[async_trait]
impl JobSource for FeedScraper {
    fn name(&self) -> &'static str {
        "rss"
    }

    async fn fetch(&self, search_terms: &[String]) -> Result<Vec<RawJob>, ScrapeError> {
        let mut all_jobs = Vec::new();
        for feed_url in RSS_FEEDS {
            match self.fetch_feed(feed_url, search_terms).await {
                Ok(jobs) => all_jobs.extend(jobs),
                Err(e) => warn!("rss: feed {feed_url} failed: {e}"),
            }
        }
        Ok(all_jobs)
    }
}

fn matches_terms(item: &rss::Item, search_terms: &[String]) -> bool {
    if search_terms.is_empty() {
        return true;
    }
    let title = item.title().unwrap_or("").to_lowercase();
    let summary = item.description().unwrap_or("").to_lowercase();
    search_terms.iter().any(|term| {
        let term = term.to_lowercase();
        title.contains(&term) || summary.contains(&term)
    })
}

fn to_raw_job(item: &rss::Item) -> RawJob {
    // Feeds rarely carry a company field; the author is the best stand-in.
    let company = match item.author().unwrap_or("").trim() {
        "" => "Unknown".to_string(),
        author => author.to_string(),
    };

    RawJob {
        title: item.title().unwrap_or("").to_string(),
        company,
        location: String::new(),
        description: item.description().unwrap_or("").to_string(),
        source_url: item.link().unwrap_or("").to_string(),
        posted_at: item.pub_date().map(str::to_string),
        extra: Value::Null,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, description: &str, author: Option<&str>) -> rss::Item {
        let mut item = rss::Item::default();
        item.set_title(title.to_string());
        item.set_description(description.to_string());
        item.set_link("https://example.com/job/1".to_string());
        item.set_pub_date("Mon, 03 Nov 2025 12:00:00 GMT".to_string());
        if let Some(a) = author {
            item.set_author(a.to_string());
        }
        item
    }

    #[test]
    fn test_to_raw_job_maps_fields() {
        let raw = to_raw_job(&item("Rust Developer", "Remote role", Some("Acme")));
        assert_eq!(raw.title, "Rust Developer");
        assert_eq!(raw.company, "Acme");
        assert_eq!(raw.source_url, "https://example.com/job/1");
        assert_eq!(raw.posted_at.as_deref(), Some("Mon, 03 Nov 2025 12:00:00 GMT"));
    }

    #[test]
    fn test_missing_author_becomes_unknown() {
        let raw = to_raw_job(&item("Rust Developer", "Remote role", None));
        assert_eq!(raw.company, "Unknown");
    }

    #[test]
    fn test_matches_terms_checks_title_and_summary() {
        let i = item("Senior Go Engineer", "Kubernetes platform work", Some("Acme"));
        assert!(matches_terms(&i, &["go".to_string()]));
        assert!(matches_terms(&i, &["kubernetes".to_string()]));
        assert!(!matches_terms(&i, &["cobol".to_string()]));
        assert!(matches_terms(&i, &[]));
    }
}
