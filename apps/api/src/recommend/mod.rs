//! Recommendation scoring — blends embedding similarity with normalized
//! skill overlap, gates weak candidates, and guarantees a non-empty result
//! whenever any candidates exist.
//!
//! Scoring never mutates job rows; the only write on this path is the lazy
//! persist of a regenerated user embedding.

use std::cmp::Ordering;
use std::collections::HashSet;

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::embeddings::{cosine_similarity, EmbeddingsClient};
use crate::errors::AppError;
use crate::heuristics::{ScoringConfig, SkillTables};
use crate::llm_client::LlmClient;
use crate::models::job::JobPostingRow;
use crate::models::user::UserRow;
use crate::skills::normalize_skill;

pub mod handlers;
pub mod prompts;

/// How many active jobs are pulled as candidates per request.
const CANDIDATE_LIMIT: i64 = 500;
/// How many top recommendations get an LLM explanation.
const EXPLAIN_TOP_N: usize = 3;

#[derive(Debug, Clone)]
pub struct ScoredJob {
    pub job: JobPostingRow,
    pub similarity_score: f32,
    pub skill_match_count: usize,
    pub skill_match_ratio: f32,
    pub combined_score: f32,
    pub explanation: Option<String>,
}

/// Scores and gates candidates, returning survivors sorted by combined
/// score descending.
pub fn score_jobs(
    user_skills: &[String],
    user_embedding: Option<&[f32]>,
    candidates: &[JobPostingRow],
    scoring: &ScoringConfig,
    tables: &SkillTables,
) -> Vec<ScoredJob> {
    let user_set: HashSet<String> = user_skills
        .iter()
        .map(|s| normalize_skill(s, tables))
        .filter(|s| !s.is_empty())
        .collect();

    let mut scored: Vec<ScoredJob> = candidates
        .iter()
        .filter_map(|job| {
            let job_set: HashSet<String> = job
                .required_skills
                .iter()
                .map(|s| normalize_skill(s, tables))
                .filter(|s| !s.is_empty())
                .collect();

            let skill_match_count = user_set.intersection(&job_set).count();
            let skill_match_ratio = if job_set.is_empty() {
                0.0
            } else {
                skill_match_count as f32 / job_set.len() as f32
            };

            let similarity_score = match (user_embedding, &job.description_embedding) {
                (Some(user_vec), Some(Json(job_vec))) => cosine_similarity(user_vec, job_vec),
                _ => 0.0,
            };

            // Skill-only boost when no embedding signal exists; otherwise a
            // weighted blend of both signals.
            let combined_score = if similarity_score == 0.0 && skill_match_ratio > 0.0 {
                skill_match_ratio * scoring.skill_only_boost
            } else {
                similarity_score * scoring.similarity_weight
                    + skill_match_ratio * scoring.skill_weight
            };

            let included = skill_match_count > 0
                || similarity_score > scoring.include_similarity_floor
                || combined_score > scoring.include_combined_floor;

            included.then(|| ScoredJob {
                job: job.clone(),
                similarity_score,
                skill_match_count,
                skill_match_ratio,
                combined_score,
                explanation: None,
            })
        })
        .collect();

    scored.sort_by(|a, b| cmp_desc(a.combined_score, b.combined_score));
    scored
}

/// Applies the stricter endpoint filter; if that would leave the caller
/// empty-handed while candidates exist, falls back to the top entries by
/// raw similarity. Result is sorted by combined score and bounded by
/// `limit`.
pub fn refine_with_fallback(
    mut scored: Vec<ScoredJob>,
    scoring: &ScoringConfig,
    limit: usize,
) -> Vec<ScoredJob> {
    let mut filtered: Vec<ScoredJob> = scored
        .iter()
        .filter(|s| {
            s.skill_match_count > 0
                || s.similarity_score > scoring.refine_similarity_floor
                || s.combined_score > scoring.refine_combined_floor
        })
        .cloned()
        .collect();

    if filtered.is_empty() && !scored.is_empty() {
        warn!("No jobs passed the refine filter, falling back to top similarity");
        scored.sort_by(|a, b| cmp_desc(a.similarity_score, b.similarity_score));
        filtered = scored.into_iter().take(limit).collect();
    }

    filtered.sort_by(|a, b| cmp_desc(a.combined_score, b.combined_score));
    filtered.truncate(limit);
    filtered
}

fn cmp_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Full recommendation pipeline: resolve the user embedding (regenerating
/// and persisting it when absent), fetch candidates, score, refine, and
/// attach explanations to the top entries.
pub async fn recommend_for_user(
    db: &PgPool,
    embeddings: &EmbeddingsClient,
    llm: &LlmClient,
    scoring: &ScoringConfig,
    tables: &SkillTables,
    user: &UserRow,
    limit: usize,
) -> Result<Vec<ScoredJob>, AppError> {
    let user_embedding = resolve_user_embedding(db, embeddings, user).await;

    let candidates: Vec<JobPostingRow> =
        sqlx::query_as("SELECT * FROM job_postings WHERE is_active = true LIMIT $1")
            .bind(CANDIDATE_LIMIT)
            .fetch_all(db)
            .await?;
    info!(
        "Scoring {} active jobs for user {}",
        candidates.len(),
        user.id
    );

    let scored = score_jobs(
        &user.skills,
        user_embedding.as_deref(),
        &candidates,
        scoring,
        tables,
    );
    let mut top = refine_with_fallback(scored, scoring, limit);

    for entry in top.iter_mut().take(EXPLAIN_TOP_N) {
        let explanation = explain_match(llm, entry).await;
        entry.explanation = Some(explanation);
    }

    info!("Returning {} recommendations for user {}", top.len(), user.id);
    Ok(top)
}

/// Loads the stored resume embedding, or regenerates one from the profile
/// text and persists it. Failures degrade to skill-only scoring.
async fn resolve_user_embedding(
    db: &PgPool,
    embeddings: &EmbeddingsClient,
    user: &UserRow,
) -> Option<Vec<f32>> {
    if let Some(Json(stored)) = &user.resume_embedding {
        if !stored.is_empty() {
            return Some(stored.clone());
        }
    }

    let profile_text = user.profile_text();
    if profile_text.trim().is_empty() {
        warn!("No profile text available to embed for user {}", user.id);
        return None;
    }

    match embeddings.embed(&profile_text).await {
        Ok(vector) => {
            let persisted = sqlx::query("UPDATE users SET resume_embedding = $1 WHERE id = $2")
                .bind(Json(vector.clone()))
                .bind(user.id)
                .execute(db)
                .await;
            match persisted {
                Ok(_) => info!("Generated and stored embedding for user {}", user.id),
                Err(e) => warn!("Could not persist embedding for user {}: {e}", user.id),
            }
            Some(vector)
        }
        Err(e) => {
            warn!("Embedding generation failed for user {}: {e}", user.id);
            None
        }
    }
}

/// One-to-two sentence LLM explanation; any failure yields the generic
/// fallback string.
async fn explain_match(llm: &LlmClient, entry: &ScoredJob) -> String {
    let prompt = prompts::explanation_prompt(entry);
    match llm.call(&prompt, "", 0.7, 150).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("Explanation generation failed for job {}: {e}", entry.job.id);
            prompts::FALLBACK_EXPLANATION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristics;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn job(skills: &[&str], embedding: Option<Vec<f32>>) -> JobPostingRow {
        JobPostingRow {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: Some("Remote".to_string()),
            description: "Build services".to_string(),
            job_type: Some("full-time".to_string()),
            experience_level: Some("mid".to_string()),
            salary_min: None,
            salary_max: None,
            salary_currency: Some("USD".to_string()),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            source: "board".to_string(),
            source_url: format!("https://example.com/{}", Uuid::new_v4()),
            posted_date: None,
            application_url: None,
            description_embedding: embedding.map(Json),
            title_embedding: None,
            is_active: true,
            is_verified: false,
            job_metadata: json!({}),
            created_at: Utc::now(),
            updated_at: None,
            scraped_at: Utc::now(),
        }
    }

    fn defaults() -> (ScoringConfig, SkillTables) {
        let h = Heuristics::default();
        (h.scoring, h.skills)
    }

    #[test]
    fn test_skill_only_boost_branch() {
        // User ["Python","AWS"] with no embedding vs job ["python","docker"]:
        // one match out of two -> ratio 0.5, boosted combined 0.4.
        let (scoring, tables) = defaults();
        let jobs = vec![job(&["python", "docker"], None)];
        let scored = score_jobs(
            &["Python".to_string(), "AWS".to_string()],
            None,
            &jobs,
            &scoring,
            &tables,
        );

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].skill_match_count, 1);
        assert!((scored[0].skill_match_ratio - 0.5).abs() < 1e-6);
        assert_eq!(scored[0].similarity_score, 0.0);
        assert!((scored[0].combined_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_blended_score_when_both_signals_present() {
        let (scoring, tables) = defaults();
        let user_vec = vec![1.0, 0.0];
        // identical embedding -> similarity 1.0; full skill match -> ratio 1.0
        let jobs = vec![job(&["python"], Some(vec![1.0, 0.0]))];
        let scored = score_jobs(
            &["python".to_string()],
            Some(&user_vec),
            &jobs,
            &scoring,
            &tables,
        );
        assert!((scored[0].combined_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inclusion_gate_excludes_weak_candidates() {
        let (scoring, tables) = defaults();
        // Orthogonal embedding -> similarity 0; no skill overlap; job lists
        // skills so ratio is 0 -> combined 0. Must be excluded.
        let user_vec = vec![1.0, 0.0];
        let jobs = vec![job(&["haskell"], Some(vec![0.0, 1.0]))];
        let scored = score_jobs(
            &["python".to_string()],
            Some(&user_vec),
            &jobs,
            &scoring,
            &tables,
        );
        assert!(scored.is_empty());
    }

    #[test]
    fn test_any_skill_overlap_always_included() {
        let (scoring, tables) = defaults();
        // Similarity near zero but one overlapping skill keeps the job in.
        let user_vec = vec![1.0, 0.0];
        let jobs = vec![job(
            &["python", "docker", "kafka", "spark", "airflow", "terraform"],
            Some(vec![0.0, 1.0]),
        )];
        let scored = score_jobs(
            &["python".to_string()],
            Some(&user_vec),
            &jobs,
            &scoring,
            &tables,
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].skill_match_count, 1);
    }

    #[test]
    fn test_normalization_bridges_variant_spellings() {
        let (scoring, tables) = defaults();
        let jobs = vec![job(&["Node.js", "TypeScript"], None)];
        let scored = score_jobs(
            &["nodejs".to_string(), "ts".to_string()],
            None,
            &jobs,
            &scoring,
            &tables,
        );
        assert_eq!(scored[0].skill_match_count, 2);
        assert!((scored[0].skill_match_ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_job_without_listed_skills_has_zero_ratio() {
        let (scoring, tables) = defaults();
        let user_vec = vec![1.0, 0.0];
        // High similarity carries it through the gate despite no skills.
        let jobs = vec![job(&[], Some(vec![1.0, 0.0]))];
        let scored = score_jobs(
            &["python".to_string()],
            Some(&user_vec),
            &jobs,
            &scoring,
            &tables,
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].skill_match_ratio, 0.0);
        assert!((scored[0].similarity_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sorted_by_combined_score_descending() {
        let (scoring, tables) = defaults();
        let jobs = vec![
            job(&["python", "docker", "kafka", "spark"], None), // ratio 0.25
            job(&["python"], None),                             // ratio 1.0
            job(&["python", "docker"], None),                   // ratio 0.5
        ];
        let scored = score_jobs(&["python".to_string()], None, &jobs, &scoring, &tables);
        assert_eq!(scored.len(), 3);
        assert!(scored[0].combined_score >= scored[1].combined_score);
        assert!(scored[1].combined_score >= scored[2].combined_score);
    }

    #[test]
    fn test_refine_keeps_matching_jobs_and_truncates() {
        let (scoring, tables) = defaults();
        let jobs: Vec<JobPostingRow> = (0..5).map(|_| job(&["python"], None)).collect();
        let scored = score_jobs(&["python".to_string()], None, &jobs, &scoring, &tables);
        let top = refine_with_fallback(scored, &scoring, 3);
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_refine_fallback_returns_nonempty_when_candidates_exist() {
        let (scoring, _tables) = defaults();
        // A candidate that fails every refine threshold still comes back
        // through the similarity fallback.
        let entry = ScoredJob {
            job: job(&[], None),
            similarity_score: 0.12,
            skill_match_count: 0,
            skill_match_ratio: 0.0,
            combined_score: 0.0,
            explanation: None,
        };
        let top = refine_with_fallback(vec![entry], &scoring, 10);
        assert_eq!(top.len(), 1, "fallback must keep the result non-empty");
    }

    #[test]
    fn test_refine_fallback_bounded_by_limit() {
        let (scoring, _) = defaults();
        let entries: Vec<ScoredJob> = (0..8)
            .map(|i| ScoredJob {
                job: job(&[], None),
                similarity_score: 0.01 * i as f32,
                skill_match_count: 0,
                skill_match_ratio: 0.0,
                combined_score: 0.0,
                explanation: None,
            })
            .collect();
        let top = refine_with_fallback(entries, &scoring, 4);
        assert_eq!(top.len(), 4);
    }

    #[test]
    fn test_refine_empty_input_stays_empty() {
        let (scoring, _) = defaults();
        assert!(refine_with_fallback(vec![], &scoring, 10).is_empty());
    }
}
