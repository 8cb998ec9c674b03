use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use tracing::warn;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::models::job::JobPostingRow;
use crate::resume::{extract_text, parse_resume};
use crate::skill_gap::analyze_skill_gap;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<String>,
    pub education_level: Option<String>,
    pub preferred_locations: Option<Vec<String>>,
    pub preferred_job_types: Option<Vec<String>>,
    pub onboarding_completed: Option<bool>,
}

/// GET /api/user/profile
pub async fn handle_get_profile(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "full_name": user.full_name,
        "skills": user.skills,
        "experience_years": user.experience_years,
        "education_level": user.education_level,
        "preferred_locations": user.preferred_locations,
        "preferred_job_types": user.preferred_job_types,
        "onboarding_completed": user.onboarding_completed,
        "is_admin": user.is_admin,
    }))
}

/// PATCH /api/user/profile — partial update, absent fields untouched.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    sqlx::query(
        r#"
        UPDATE users SET
            full_name = COALESCE($1, full_name),
            skills = COALESCE($2, skills),
            experience_years = COALESCE($3, experience_years),
            education_level = COALESCE($4, education_level),
            preferred_locations = COALESCE($5, preferred_locations),
            preferred_job_types = COALESCE($6, preferred_job_types),
            onboarding_completed = COALESCE($7, onboarding_completed),
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.skills)
    .bind(&update.experience_years)
    .bind(&update.education_level)
    .bind(&update.preferred_locations)
    .bind(&update.preferred_job_types)
    .bind(update.onboarding_completed)
    .bind(Utc::now())
    .bind(user.id)
    .execute(&state.db)
    .await?;

    let onboarding_completed = update.onboarding_completed.unwrap_or(user.onboarding_completed);
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": {
            "id": user.id,
            "email": user.email,
            "onboarding_completed": onboarding_completed,
        }
    })))
}

/// POST /api/user/resume — multipart upload, parsed in memory.
///
/// The parsed fields update the profile; embedding failures are non-fatal
/// (the vector regenerates lazily on the next recommendation request).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("resume.txt").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Error reading upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let resume_text = extract_text(&filename, &bytes)?;
    let parsed = parse_resume(&state.llm, &state.heuristics.skills, &resume_text).await;

    let resume_embedding = match state.embeddings.embed(&resume_text).await {
        Ok(vector) => Some(SqlJson(vector)),
        Err(e) => {
            warn!("Resume embedding failed for user {}: {e}", user.id);
            None
        }
    };

    sqlx::query(
        r#"
        UPDATE users SET
            resume_text = $1,
            resume_embedding = COALESCE($2, resume_embedding),
            full_name = COALESCE($3, full_name),
            skills = CASE WHEN $4::text[] IS NOT NULL AND cardinality($4::text[]) > 0
                          THEN $4 ELSE skills END,
            experience_years = COALESCE($5, experience_years),
            education_level = COALESCE($6, education_level),
            updated_at = $7
        WHERE id = $8
        "#,
    )
    .bind(&resume_text)
    .bind(resume_embedding)
    .bind(&parsed.full_name)
    .bind(&parsed.skills)
    .bind(&parsed.experience_years)
    .bind(&parsed.education_level)
    .bind(Utc::now())
    .bind(user.id)
    .execute(&state.db)
    .await?;

    Ok(Json(json!({
        "message": "Resume uploaded and parsed successfully",
        "parsed_data": {
            "full_name": parsed.full_name,
            "email": parsed.email,
            "phone": parsed.phone,
            "skills": parsed.skills,
            "experience_years": parsed.experience_years,
            "education_level": parsed.education_level,
            "summary": parsed.summary,
        }
    })))
}

/// GET /api/user/skill-gap/:job_id
pub async fn handle_skill_gap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let job: Option<JobPostingRow> = sqlx::query_as("SELECT * FROM job_postings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    let job = job.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let report = analyze_skill_gap(&state.llm, &state.heuristics.skills, &user, &job).await;
    Ok(Json(serde_json::to_value(report).unwrap_or_default()))
}
