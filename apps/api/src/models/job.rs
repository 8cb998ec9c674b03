use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One stored job posting. `source_url` is unique and is the dedup key for
/// scraper ingestion. Scoring never mutates these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostingRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub required_skills: Vec<String>,
    pub source: String,
    pub source_url: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub application_url: Option<String>,
    pub description_embedding: Option<Json<Vec<f32>>>,
    pub title_embedding: Option<Json<Vec<f32>>>,
    pub is_active: bool,
    pub is_verified: bool,
    pub job_metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedJobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    /// saved | applied | rejected
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
