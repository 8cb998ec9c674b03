use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extract::{ensure_admin, AuthUser};
use crate::errors::AppError;
use crate::models::job::JobPostingRow;
use crate::models::user::UserRow;
use crate::scrape::ingest::run_scrape;
use crate::scrape::{Fetcher, VALID_SOURCES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_conversations: i64,
    pub jobs_by_source: HashMap<String, i64>,
}

/// GET /api/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<AdminStats>, AppError> {
    ensure_admin(&user)?;

    let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;
    let (total_jobs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_postings")
        .fetch_one(&state.db)
        .await?;
    let (active_jobs,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM job_postings WHERE is_active = true")
            .fetch_one(&state.db)
            .await?;
    let (total_conversations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
        .fetch_one(&state.db)
        .await?;
    let by_source: Vec<(String, i64)> =
        sqlx::query_as("SELECT source, COUNT(*) FROM job_postings GROUP BY source")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(AdminStats {
        total_users,
        total_jobs,
        active_jobs,
        total_conversations,
        jobs_by_source: by_source.into_iter().collect(),
    }))
}

/// GET /api/admin/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_postings")
        .fetch_one(&state.db)
        .await?;
    let jobs: Vec<JobPostingRow> = sqlx::query_as(
        "SELECT * FROM job_postings ORDER BY created_at DESC OFFSET $1 LIMIT $2",
    )
    .bind((page - 1) * page_size)
    .bind(page_size)
    .fetch_all(&state.db)
    .await?;

    let jobs: Vec<Value> = jobs
        .into_iter()
        .map(|job| {
            json!({
                "id": job.id,
                "title": job.title,
                "company": job.company,
                "location": job.location,
                "source": job.source,
                "is_active": job.is_active,
                "is_verified": job.is_verified,
                "created_at": job.created_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "jobs": jobs,
        "total": total,
        "page": page,
        "page_size": page_size,
    })))
}

/// GET /api/admin/jobs/:job_id
pub async fn handle_job_details(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let job: Option<JobPostingRow> = sqlx::query_as("SELECT * FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    let job = job.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    Ok(Json(json!({
        "id": job.id,
        "title": job.title,
        "company": job.company,
        "location": job.location,
        "description": job.description,
        "job_type": job.job_type,
        "source": job.source,
        "source_url": job.source_url,
        "is_active": job.is_active,
        "is_verified": job.is_verified,
        "created_at": job.created_at,
        "updated_at": job.updated_at,
        "scraped_at": job.scraped_at,
        "metadata": job.job_metadata,
    })))
}

#[derive(Debug, Deserialize)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub job_type: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// PATCH /api/admin/jobs/:job_id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    AuthUser(user): AuthUser,
    Json(update): Json<JobUpdate>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let result = sqlx::query(
        r#"
        UPDATE job_postings SET
            title = COALESCE($1, title),
            company = COALESCE($2, company),
            location = COALESCE($3, location),
            description = COALESCE($4, description),
            job_type = COALESCE($5, job_type),
            is_active = COALESCE($6, is_active),
            is_verified = COALESCE($7, is_verified),
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(&update.title)
    .bind(&update.company)
    .bind(&update.location)
    .bind(&update.description)
    .bind(&update.job_type)
    .bind(update.is_active)
    .bind(update.is_verified)
    .bind(Utc::now())
    .bind(job_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    Ok(Json(json!({
        "message": "Job updated successfully",
        "job_id": job_id,
    })))
}

/// DELETE /api/admin/jobs/:job_id — hard delete, dependents first.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let job: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if job.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let deleted_saved = sqlx::query("DELETE FROM saved_jobs WHERE job_id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let deleted_skills = sqlx::query("DELETE FROM job_skills WHERE job_id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM job_postings WHERE id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Json(json!({
        "message": "Job deleted successfully",
        "deleted_saved_jobs": deleted_saved,
        "deleted_job_skills": deleted_skills,
    })))
}

/// GET /api/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);

    const FILTER: &str = r#"
        ($1::text IS NULL OR email ILIKE '%' || $1 || '%'
         OR full_name ILIKE '%' || $1 || '%')
    "#;

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM users WHERE {FILTER}"))
        .bind(&params.search)
        .fetch_one(&state.db)
        .await?;

    let users: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT * FROM users WHERE {FILTER} ORDER BY created_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(&params.search)
    .bind((page - 1) * page_size)
    .bind(page_size)
    .fetch_all(&state.db)
    .await?;

    let users: Vec<Value> = users
        .into_iter()
        .map(|u| {
            json!({
                "id": u.id,
                "email": u.email,
                "full_name": u.full_name,
                "onboarding_completed": u.onboarding_completed,
                "skills_count": u.skills.len(),
                "created_at": u.created_at,
                "last_login": u.last_login,
            })
        })
        .collect();

    Ok(Json(json!({
        "users": users,
        "total": total,
        "page": page,
        "page_size": page_size,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub source: String,
    pub search_terms: Vec<String>,
}

/// POST /api/admin/jobs/scrape — manual trigger; sources run sequentially.
pub async fn handle_trigger_scrape(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    if !VALID_SOURCES.contains(&req.source.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid source: {}. Supported sources: {}",
            req.source,
            VALID_SOURCES.join(", ")
        )));
    }

    let fetcher = Fetcher::new(
        &state.config.scrape_user_agent,
        state.config.scrape_rate_limit_per_minute,
    );
    let report = run_scrape(
        &state.db,
        &state.embeddings,
        &state.heuristics.skills,
        fetcher,
        &req.source,
        &req.search_terms,
    )
    .await?;

    Ok(Json(json!({
        "message": "Scraping completed",
        "jobs_scraped": report.jobs_scraped,
        "jobs_saved": report.jobs_saved,
        "errors": report.errors,
    })))
}
