//! Job-board scraper — paginated HTML search results.
//!
//! Board markup shifts frequently, so card selection tries a list of
//! selectors in order and takes the first that matches anything.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use crate::scrape::{Fetcher, JobSource, RawJob, ScrapeError};

const BASE_URL: &str = "https://www.indeed.com/jobs";
const MAX_PAGES: usize = 2;
const RESULTS_PER_PAGE: usize = 10;

static CARD_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["div.job_seen_beacon", "div[data-jk]", "a[data-jk]"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("h2.jobTitle a").unwrap());
static COMPANY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[data-testid="company-name"]"#).unwrap());
static LOCATION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-testid="text-location"]"#).unwrap());
static SNIPPET: Lazy<Selector> = Lazy::new(|| Selector::parse("div.job-snippet").unwrap());

pub struct BoardScraper {
    fetcher: Fetcher,
}

impl BoardScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn fetch_term(&self, term: &str) -> Vec<RawJob> {
        let mut jobs = Vec::new();

        for page in 0..MAX_PAGES {
            let url = match reqwest::Url::parse_with_params(
                BASE_URL,
                &[
                    ("q", term.to_string()),
                    ("start", (page * RESULTS_PER_PAGE).to_string()),
                ],
            ) {
                Ok(u) => u.to_string(),
                Err(e) => {
                    warn!("board: failed to build search URL for {term:?}: {e}");
                    break;
                }
            };

            let html = match self.fetcher.get_text(&url).await {
                Ok(body) => body,
                Err(e) => {
                    // Per-page failures skip to the next page, matching the
                    // degrade-don't-abort policy everywhere else.
                    warn!("board: page {page} for {term:?} failed: {e}");
                    continue;
                }
            };

            let page_jobs = parse_job_listings(&html);
            debug!(
                "board: found {} jobs on page {page} for {term:?}",
                page_jobs.len()
            );
            if page_jobs.is_empty() {
                break;
            }
            jobs.extend(page_jobs);
        }

        jobs
    }
}

#[async_trait]
impl JobSource for BoardScraper {
    fn name(&self) -> &'static str {
        "board"
    }

    async fn fetch(&self, search_terms: &[String]) -> Result<Vec<RawJob>, ScrapeError> {
        let mut all_jobs = Vec::new();
        for term in search_terms {
            all_jobs.extend(self.fetch_term(term).await);
        }
        Ok(all_jobs)
    }
}

/// Parses one search-results page. Cards missing a title or company are
/// dropped.
fn parse_job_listings(html: &str) -> Vec<RawJob> {
    let doc = Html::parse_document(html);

    let cards: Vec<ElementRef> = CARD_SELECTORS
        .iter()
        .map(|sel| doc.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    let mut jobs = Vec::new();
    for card in cards {
        let title_link = card.select(&TITLE_LINK).next();
        let title = title_link.map(element_text).unwrap_or_default();
        let company = card.select(&COMPANY).next().map(element_text).unwrap_or_default();
        if title.is_empty() || company.is_empty() {
            continue;
        }

        let location = card.select(&LOCATION).next().map(element_text).unwrap_or_default();
        let description = card.select(&SNIPPET).next().map(element_text).unwrap_or_default();
        let source_url = title_link
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                if href.starts_with('/') {
                    format!("https://www.indeed.com{href}")
                } else {
                    href.to_string()
                }
            })
            .unwrap_or_default();

        jobs.push(RawJob {
            title,
            company,
            location,
            description,
            source_url,
            extra: Value::Null,
            ..Default::default()
        });
    }

    jobs
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"
        <html><body>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/viewjob?jk=abc123">Backend Engineer</a></h2>
            <span data-testid="company-name">Acme Corp</span>
            <div data-testid="text-location">Remote</div>
            <div class="job-snippet">Build APIs with Python and PostgreSQL.</div>
          </div>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="https://example.com/job/2">Data Engineer</a></h2>
            <span data-testid="company-name">Globex</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_extracts_cards() {
        let jobs = parse_job_listings(SAMPLE_PAGE);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Backend Engineer");
        assert_eq!(jobs[0].company, "Acme Corp");
        assert_eq!(jobs[0].location, "Remote");
        assert!(jobs[0].description.contains("PostgreSQL"));
    }

    #[test]
    fn test_parse_resolves_relative_urls() {
        let jobs = parse_job_listings(SAMPLE_PAGE);
        assert_eq!(jobs[0].source_url, "https://www.indeed.com/viewjob?jk=abc123");
        assert_eq!(jobs[1].source_url, "https://example.com/job/2");
    }

    #[test]
    fn test_parse_drops_cards_without_title_or_company() {
        let html = r#"
            <div class="job_seen_beacon">
              <span data-testid="company-name">Nameless Role Inc</span>
            </div>
        "#;
        assert!(parse_job_listings(html).is_empty());
    }

    #[test]
    fn test_parse_falls_back_to_data_jk_cards() {
        let html = r#"
            <div data-jk="xyz">
              <h2 class="jobTitle"><a href="/viewjob?jk=xyz">SRE</a></h2>
              <span data-testid="company-name">Initech</span>
            </div>
        "#;
        let jobs = parse_job_listings(html);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "SRE");
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_job_listings("<html><body></body></html>").is_empty());
    }
}
