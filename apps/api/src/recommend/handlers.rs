use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::extract::AuthUser;
use crate::recommend::{recommend_for_user, ScoredJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// GET /api/recommendations
///
/// Never returns an error status: failures degrade to an empty list with a
/// generic message, with the raw error detail included only for admins.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationsQuery>,
    AuthUser(user): AuthUser,
) -> Json<Value> {
    if !user.onboarding_completed {
        return Json(json!({
            "recommendations": [],
            "count": 0,
            "message": "Please complete your profile to get personalized recommendations"
        }));
    }

    let limit = params.limit.clamp(1, 50);
    let result = recommend_for_user(
        &state.db,
        &state.embeddings,
        &state.llm,
        &state.heuristics.scoring,
        &state.heuristics.skills,
        &user,
        limit,
    )
    .await;

    match result {
        Ok(recommendations) => {
            let entries: Vec<Value> = recommendations.iter().map(scored_job_json).collect();
            Json(json!({
                "recommendations": entries,
                "count": entries.len()
            }))
        }
        Err(e) => {
            error!("Error getting recommendations for user {}: {e}", user.id);
            Json(json!({
                "recommendations": [],
                "count": 0,
                "message": "Unable to generate recommendations at this time. Please try again later.",
                "error": user.is_admin.then(|| e.to_string())
            }))
        }
    }
}

fn scored_job_json(entry: &ScoredJob) -> Value {
    let job = &entry.job;
    json!({
        "id": job.id,
        "title": job.title,
        "company": job.company,
        "location": job.location,
        "job_type": job.job_type,
        "description": job.description,
        "required_skills": job.required_skills,
        "application_url": job.application_url,
        "source": job.source,
        "salary_min": job.salary_min,
        "salary_max": job.salary_max,
        "similarity_score": entry.similarity_score,
        "skill_match_count": entry.skill_match_count,
        "skill_match_ratio": entry.skill_match_ratio,
        "combined_score": entry.combined_score,
        "explanation": entry.explanation,
    })
}
