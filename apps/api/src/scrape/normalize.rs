//! Job normalization — maps raw scraped postings onto the fixed schema:
//! skill extraction, salary parsing, job-type and experience-level
//! classification, and embedding generation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::warn;

use crate::embeddings::EmbeddingsClient;
use crate::heuristics::SkillTables;
use crate::scrape::RawJob;
use crate::skills::extract_skills;

/// A posting in the unified shape the ingest step persists.
#[derive(Debug, Clone)]
pub struct NormalizedJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_type: String,
    pub experience_level: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: String,
    pub required_skills: Vec<String>,
    pub source: String,
    pub source_url: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub application_url: String,
    pub description_embedding: Option<Vec<f32>>,
    pub title_embedding: Option<Vec<f32>>,
    pub job_metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryInfo {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: String,
}

/// Salary patterns, tried in order; first match wins.
static SALARY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "$80,000 - $120,000" / "$80k - $120K"
        r"(?i)\$(\d{1,3}(?:,\d{3})*k?)\s*-\s*\$(\d{1,3}(?:,\d{3})*k?)",
        // "$95k/yr"
        r"(?i)\$(\d{1,3}(?:,\d{3})*k?)\s*/\s*yr",
        // "80k - 120k USD"
        r"(?i)(\d{1,3}(?:,\d{3})*k?)\s*-\s*(\d{1,3}(?:,\d{3})*k?)\s*USD",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Normalizes one raw posting. Embedding failures are swallowed — the
/// posting still persists, just without vectors.
pub async fn normalize_job(
    raw: &RawJob,
    source: &str,
    embeddings: &EmbeddingsClient,
    tables: &SkillTables,
) -> NormalizedJob {
    let required_skills = extract_skills(&raw.description, tables);
    let salary = extract_salary(&format!("{} {}", raw.description, raw.salary));
    let job_type = determine_job_type(&format!("{} {}", raw.title, raw.description));
    let experience_level =
        determine_experience_level(&format!("{} {}", raw.title, raw.description));

    let description_embedding = embed_or_none(embeddings, &raw.description, "description").await;
    let title_embedding = embed_or_none(embeddings, &raw.title, "title").await;

    let location = match raw.location.trim() {
        "" => "Remote".to_string(),
        loc => loc.to_string(),
    };

    NormalizedJob {
        title: raw.title.trim().to_string(),
        company: raw.company.trim().to_string(),
        location,
        description: raw.description.trim().to_string(),
        job_type: job_type.to_string(),
        experience_level: experience_level.to_string(),
        salary_min: salary.min,
        salary_max: salary.max,
        salary_currency: salary.currency,
        required_skills,
        source: source.to_string(),
        source_url: raw.source_url.clone(),
        posted_date: raw.posted_at.as_deref().and_then(parse_date),
        application_url: raw.source_url.clone(),
        description_embedding,
        title_embedding,
        job_metadata: json!({
            "original_data": {
                "salary": raw.salary,
                "tags": raw.tags,
                "posted_at": raw.posted_at,
                "extra": raw.extra,
            }
        }),
    }
}

async fn embed_or_none(
    embeddings: &EmbeddingsClient,
    text: &str,
    field: &str,
) -> Option<Vec<f32>> {
    if text.is_empty() {
        return None;
    }
    match embeddings.embed(text).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            warn!("embedding {field} failed during normalization: {e}");
            None
        }
    }
}

/// Tries each salary pattern in order. The result is ordered min <= max
/// regardless of which group matched the larger figure.
pub fn extract_salary(text: &str) -> SalaryInfo {
    for pattern in SALARY_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let first = caps.get(1).and_then(|m| parse_salary_value(m.as_str()));
            let second = caps.get(2).and_then(|m| parse_salary_value(m.as_str()));
            if let Some(a) = first {
                let b = second.unwrap_or(a);
                return SalaryInfo {
                    min: Some(a.min(b)),
                    max: Some(a.max(b)),
                    currency: "USD".to_string(),
                };
            }
        }
    }
    SalaryInfo {
        min: None,
        max: None,
        currency: "USD".to_string(),
    }
}

/// Parses a salary figure, handling thousands separators and a `k` suffix.
fn parse_salary_value(value: &str) -> Option<f64> {
    let cleaned = value.replace([',', '$'], "");
    let cleaned = cleaned.trim();
    if let Some(stripped) = cleaned.strip_suffix(['k', 'K']) {
        stripped.parse::<f64>().ok().map(|v| v * 1000.0)
    } else {
        cleaned.parse::<f64>().ok()
    }
}

/// Keyword presence test in priority order; full-time is the default.
pub fn determine_job_type(text: &str) -> &'static str {
    let text = text.to_lowercase();
    if text.contains("intern") {
        "internship"
    } else if text.contains("part-time") || text.contains("part time") {
        "part-time"
    } else if text.contains("contract") || text.contains("freelance") {
        "contract"
    } else {
        "full-time"
    }
}

/// Keyword presence test in priority order; mid is the default.
pub fn determine_experience_level(text: &str) -> &'static str {
    let text = text.to_lowercase();
    const SENIOR: &[&str] = &["senior", "lead", "principal", "architect"];
    const MID: &[&str] = &["mid", "middle", "intermediate", "2-5", "3-5"];
    const ENTRY: &[&str] = &["junior", "entry", "graduate", "0-2", "1-2"];

    if SENIOR.iter().any(|kw| text.contains(kw)) {
        "senior"
    } else if MID.iter().any(|kw| text.contains(kw)) {
        "mid"
    } else if ENTRY.iter().any(|kw| text.contains(kw)) {
        "entry"
    } else {
        "mid"
    }
}

/// Parses source publication dates: RFC 2822 (RSS), RFC 3339, or bare dates.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_dollar_range_with_k_suffix() {
        let s = extract_salary("Compensation: $80k - $120k plus equity");
        assert_eq!(s.min, Some(80_000.0));
        assert_eq!(s.max, Some(120_000.0));
        assert_eq!(s.currency, "USD");
    }

    #[test]
    fn test_salary_reversed_magnitudes_still_ordered() {
        let s = extract_salary("$120k - $80k");
        assert_eq!(s.min, Some(80_000.0));
        assert_eq!(s.max, Some(120_000.0));
    }

    #[test]
    fn test_salary_single_yearly_figure() {
        let s = extract_salary("Pays $95k /yr with benefits");
        assert_eq!(s.min, Some(95_000.0));
        assert_eq!(s.max, Some(95_000.0));
    }

    #[test]
    fn test_salary_bare_range_with_usd_suffix() {
        let s = extract_salary("Range 90,000 - 130,000 USD annually");
        assert_eq!(s.min, Some(90_000.0));
        assert_eq!(s.max, Some(130_000.0));
    }

    #[test]
    fn test_salary_first_pattern_wins() {
        let s = extract_salary("$70k - $90k, or 100k - 120k USD abroad");
        assert_eq!(s.min, Some(70_000.0));
        assert_eq!(s.max, Some(90_000.0));
    }

    #[test]
    fn test_salary_absent() {
        let s = extract_salary("Competitive compensation");
        assert_eq!(s.min, None);
        assert_eq!(s.max, None);
    }

    #[test]
    fn test_parse_salary_value_variants() {
        assert_eq!(parse_salary_value("80k"), Some(80_000.0));
        assert_eq!(parse_salary_value("120K"), Some(120_000.0));
        assert_eq!(parse_salary_value("95,000"), Some(95_000.0));
        assert_eq!(parse_salary_value("not-a-number"), None);
    }

    #[test]
    fn test_job_type_priority_order() {
        assert_eq!(determine_job_type("Software Engineering Intern"), "internship");
        assert_eq!(determine_job_type("Part-time contract work"), "part-time");
        assert_eq!(determine_job_type("6-month contract role"), "contract");
        assert_eq!(determine_job_type("Freelance designer"), "contract");
        assert_eq!(determine_job_type("Backend engineer"), "full-time");
    }

    #[test]
    fn test_experience_level_priority_order() {
        assert_eq!(determine_experience_level("Senior Backend Engineer"), "senior");
        // senior keywords outrank mid/entry keywords in the same text
        assert_eq!(determine_experience_level("Lead engineer, 2-5 years"), "senior");
        assert_eq!(determine_experience_level("Engineer, 3-5 years experience"), "mid");
        assert_eq!(determine_experience_level("Junior developer"), "entry");
        assert_eq!(determine_experience_level("Software engineer"), "mid");
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("Mon, 03 Nov 2025 12:00:00 GMT").is_some());
        assert!(parse_date("2025-11-03T12:00:00+00:00").is_some());
        assert!(parse_date("2025-11-03").is_some());
        assert!(parse_date("last Tuesday").is_none());
        assert!(parse_date("").is_none());
    }
}
