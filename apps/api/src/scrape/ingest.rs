//! Scrape ingestion — the ordered pipeline behind the manual trigger:
//! fetch raw postings, normalize each, insert the ones whose `source_url`
//! is not already stored. Per-record failures are collected, never fatal.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::embeddings::EmbeddingsClient;
use crate::errors::AppError;
use crate::heuristics::SkillTables;
use crate::scrape::normalize::{normalize_job, NormalizedJob};
use crate::scrape::{source_for, Fetcher};

#[derive(Debug, Serialize)]
pub struct ScrapeReport {
    pub jobs_scraped: usize,
    pub jobs_saved: usize,
    pub errors: Vec<String>,
}

pub async fn run_scrape(
    db: &PgPool,
    embeddings: &EmbeddingsClient,
    tables: &SkillTables,
    fetcher: Fetcher,
    source_name: &str,
    search_terms: &[String],
) -> Result<ScrapeReport, AppError> {
    let source = source_for(source_name, fetcher)
        .ok_or_else(|| AppError::Validation(format!("Unknown source: {source_name}")))?;

    info!("Scraping {source_name} with terms: {search_terms:?}");
    let raw_jobs = source
        .fetch(search_terms)
        .await
        .map_err(|e| AppError::Scrape(format!("Scraping {source_name} failed: {e}")))?;
    info!("Scraped {} raw jobs from {source_name}", raw_jobs.len());

    let mut errors = Vec::new();
    let mut normalized = Vec::with_capacity(raw_jobs.len());
    for raw in &raw_jobs {
        normalized.push(normalize_job(raw, source_name, embeddings, tables).await);
    }

    let mut saved = 0usize;
    for job in &normalized {
        if job.source_url.is_empty() {
            errors.push(format!("Skipping {:?}: no source URL", job.title));
            continue;
        }
        match insert_if_new(db, job).await {
            Ok(true) => saved += 1,
            Ok(false) => {} // duplicate source_url, skip silently
            Err(e) => errors.push(format!("Error saving {:?}: {e}", job.title)),
        }
    }

    info!(
        "Ingest complete for {source_name}: {} scraped, {saved} saved, {} errors",
        normalized.len(),
        errors.len()
    );

    Ok(ScrapeReport {
        jobs_scraped: normalized.len(),
        jobs_saved: saved,
        errors,
    })
}

/// Inserts a normalized posting unless its `source_url` is already stored.
/// Returns whether a row was written.
async fn insert_if_new(db: &PgPool, job: &NormalizedJob) -> Result<bool, sqlx::Error> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM job_postings WHERE source_url = $1")
        .bind(&job.source_url)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO job_postings
            (id, title, company, location, description, job_type, experience_level,
             salary_min, salary_max, salary_currency, required_skills,
             source, source_url, posted_date, application_url,
             description_embedding, title_embedding, is_active, is_verified, job_metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, true, false, $18)
        ON CONFLICT (source_url) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.description)
    .bind(&job.job_type)
    .bind(&job.experience_level)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.salary_currency)
    .bind(&job.required_skills)
    .bind(&job.source)
    .bind(&job.source_url)
    .bind(job.posted_date)
    .bind(&job.application_url)
    .bind(job.description_embedding.clone().map(Json))
    .bind(job.title_embedding.clone().map(Json))
    .bind(&job.job_metadata)
    .execute(db)
    .await?;

    Ok(true)
}
