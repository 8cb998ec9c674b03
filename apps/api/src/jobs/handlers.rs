use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extract::{AuthUser, OptionalAuthUser};
use crate::errors::AppError;
use crate::models::job::{JobPostingRow, SavedJobRow};
use crate::state::AppState;

const LIST_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub company: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub source: String,
    pub source_url: String,
    pub posted_date: Option<chrono::DateTime<chrono::Utc>>,
    pub application_url: Option<String>,
    pub required_skills: Vec<String>,
    pub is_saved: bool,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl JobResponse {
    fn from_row(job: JobPostingRow, is_saved: bool, truncate: bool) -> Self {
        let description = if truncate && job.description.chars().count() > LIST_DESCRIPTION_CHARS {
            let head: String = job.description.chars().take(LIST_DESCRIPTION_CHARS).collect();
            format!("{head}...")
        } else {
            job.description
        };
        Self {
            id: job.id,
            title: job.title,
            company: job.company,
            location: job.location,
            description,
            job_type: job.job_type,
            experience_level: job.experience_level,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            source: job.source,
            source_url: job.source_url,
            posted_date: job.posted_date,
            application_url: job.application_url,
            required_skills: job.required_skills,
            is_saved,
        }
    }
}

async fn saved_job_ids(state: &AppState, user_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT job_id FROM saved_jobs WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&state.db)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
    OptionalAuthUser(user): OptionalAuthUser,
) -> Result<Json<JobListResponse>, AppError> {
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);

    const FILTER: &str = r#"
        is_active = true
        AND ($1::text IS NULL OR title ILIKE '%' || $1 || '%'
             OR description ILIKE '%' || $1 || '%'
             OR company ILIKE '%' || $1 || '%')
        AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
        AND ($3::text IS NULL OR job_type = $3)
        AND ($4::text IS NULL OR company ILIKE '%' || $4 || '%')
    "#;

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM job_postings WHERE {FILTER}"
    ))
    .bind(&params.search)
    .bind(&params.location)
    .bind(&params.job_type)
    .bind(&params.company)
    .fetch_one(&state.db)
    .await?;

    let jobs: Vec<JobPostingRow> = sqlx::query_as(&format!(
        "SELECT * FROM job_postings WHERE {FILTER} \
         ORDER BY created_at DESC OFFSET $5 LIMIT $6"
    ))
    .bind(&params.search)
    .bind(&params.location)
    .bind(&params.job_type)
    .bind(&params.company)
    .bind((page - 1) * page_size)
    .bind(page_size)
    .fetch_all(&state.db)
    .await?;

    let saved = match &user {
        Some(u) => saved_job_ids(&state, u.id).await?,
        None => HashSet::new(),
    };

    Ok(Json(JobListResponse {
        jobs: jobs
            .into_iter()
            .map(|job| {
                let is_saved = saved.contains(&job.id);
                JobResponse::from_row(job, is_saved, true)
            })
            .collect(),
        total,
        page,
        page_size,
    }))
}

/// GET /api/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    OptionalAuthUser(user): OptionalAuthUser,
) -> Result<Json<JobResponse>, AppError> {
    let job: Option<JobPostingRow> = sqlx::query_as("SELECT * FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    let job = job.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let is_saved = match &user {
        Some(u) => {
            let saved: Option<SavedJobRow> = sqlx::query_as(
                "SELECT * FROM saved_jobs WHERE user_id = $1 AND job_id = $2",
            )
            .bind(u.id)
            .bind(job_id)
            .fetch_optional(&state.db)
            .await?;
            saved.is_some()
        }
        None => false,
    };

    Ok(Json(JobResponse::from_row(job, is_saved, false)))
}

/// POST /api/jobs/:job_id/save
pub async fn handle_save_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let job: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if job.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let existing: Option<SavedJobRow> = sqlx::query_as(
        "SELECT * FROM saved_jobs WHERE user_id = $1 AND job_id = $2",
    )
    .bind(user.id)
    .bind(job_id)
    .fetch_optional(&state.db)
    .await?;

    if let Some(saved) = existing {
        return Ok(Json(json!({
            "message": "Job already saved",
            "saved_job_id": saved.id,
        })));
    }

    let saved: SavedJobRow = sqlx::query_as(
        "INSERT INTO saved_jobs (id, user_id, job_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(job_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({
        "message": "Job saved successfully",
        "saved_job_id": saved.id,
    })))
}

/// DELETE /api/jobs/:job_id/save
pub async fn handle_unsave_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
        .bind(user.id)
        .bind(job_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Saved job not found".to_string()));
    }

    Ok(Json(json!({ "message": "Job unsaved successfully" })))
}

/// GET /api/jobs/saved/list
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
    AuthUser(user): AuthUser,
) -> Result<Json<JobListResponse>, AppError> {
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM job_postings j \
         JOIN saved_jobs s ON s.job_id = j.id \
         WHERE s.user_id = $1 AND j.is_active = true",
    )
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    let jobs: Vec<JobPostingRow> = sqlx::query_as(
        "SELECT j.* FROM job_postings j \
         JOIN saved_jobs s ON s.job_id = j.id \
         WHERE s.user_id = $1 AND j.is_active = true \
         ORDER BY s.created_at DESC OFFSET $2 LIMIT $3",
    )
    .bind(user.id)
    .bind((page - 1) * page_size)
    .bind(page_size)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(JobListResponse {
        jobs: jobs
            .into_iter()
            .map(|job| JobResponse::from_row(job, true, true))
            .collect(),
        total,
        page,
        page_size,
    }))
}
