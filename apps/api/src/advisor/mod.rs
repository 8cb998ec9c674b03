//! Career advisor chat — retrieval-augmented responses.
//!
//! Flow per message: embed the message → rank active jobs by cosine
//! similarity → take the top few as context → include the recent
//! conversation turns → one LLM call. History is read fresh from storage
//! each turn; there is no in-memory session state.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::warn;

use crate::embeddings::{cosine_similarity, EmbeddingsClient};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::conversation::MessageRow;
use crate::models::job::JobPostingRow;

pub mod handlers;

const CONTEXT_JOB_LIMIT: i64 = 50;
const TOP_CONTEXT_JOBS: usize = 5;
const HISTORY_WINDOW: usize = 5;
const SNIPPET_CHARS: usize = 200;

const ADVISOR_SYSTEM: &str = "You are a helpful career advisor AI assistant. You help users with:\n\
    - Career guidance and advice\n\
    - Job search strategies\n\
    - Skill development recommendations\n\
    - Interview preparation\n\
    - Career path planning\n\n\
    Be friendly, professional, and provide actionable advice. \
    Reference relevant job opportunities when appropriate.";

const FALLBACK_RESPONSE: &str = "I apologize, but I'm having trouble processing \
    your request right now. Please try again later.";

#[derive(Debug, Clone)]
pub struct RelevantJob {
    pub title: String,
    pub company: String,
    pub snippet: String,
    pub similarity: f32,
}

/// Produces the assistant reply for one user message. Every external
/// failure degrades: no embedding → no job context, LLM failure → a
/// fallback apology.
pub async fn respond(
    db: &PgPool,
    embeddings: &EmbeddingsClient,
    llm: &LlmClient,
    user_message: &str,
    history: &[MessageRow],
) -> Result<String, AppError> {
    let relevant_jobs = match embeddings.embed(user_message).await {
        Ok(query_vec) => {
            let jobs: Vec<JobPostingRow> = sqlx::query_as(
                "SELECT * FROM job_postings \
                 WHERE is_active = true AND description_embedding IS NOT NULL \
                 LIMIT $1",
            )
            .bind(CONTEXT_JOB_LIMIT)
            .fetch_all(db)
            .await?;
            rank_jobs(&query_vec, &jobs)
        }
        Err(e) => {
            warn!("Message embedding failed, continuing without job context: {e}");
            Vec::new()
        }
    };

    let prompt = build_prompt(user_message, history, &relevant_jobs);
    match llm.call(&prompt, ADVISOR_SYSTEM, 0.7, 1000).await {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!("Advisor response generation failed: {e}");
            Ok(FALLBACK_RESPONSE.to_string())
        }
    }
}

/// Ranks jobs by similarity to the query embedding and keeps the top few.
fn rank_jobs(query_vec: &[f32], jobs: &[JobPostingRow]) -> Vec<RelevantJob> {
    let mut scored: Vec<(f32, &JobPostingRow)> = jobs
        .iter()
        .filter_map(|job| {
            let Json(vec) = job.description_embedding.as_ref()?;
            Some((cosine_similarity(query_vec, vec), job))
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(TOP_CONTEXT_JOBS)
        .map(|(similarity, job)| RelevantJob {
            title: job.title.clone(),
            company: job.company.clone(),
            snippet: job.description.chars().take(SNIPPET_CHARS).collect(),
            similarity,
        })
        .collect()
}

fn build_prompt(user_message: &str, history: &[MessageRow], relevant_jobs: &[RelevantJob]) -> String {
    let mut context = String::new();
    if !relevant_jobs.is_empty() {
        context.push_str("\n\nRelevant job opportunities:\n");
        for job in relevant_jobs {
            context.push_str(&format!("- {} at {}: {}\n", job.title, job.company, job.snippet));
        }
    }

    let mut history_text = String::new();
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for msg in &history[start..] {
        history_text.push_str(&format!("{}: {}\n", msg.role, msg.content));
    }

    format!(
        "Previous conversation:\n{history_text}\n\
         User question: {user_message}\n\
         {context}\n\
         Provide a helpful response:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn job(title: &str, embedding: Option<Vec<f32>>) -> JobPostingRow {
        JobPostingRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: None,
            description: "x".repeat(300),
            job_type: None,
            experience_level: None,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            required_skills: vec![],
            source: "board".to_string(),
            source_url: format!("https://example.com/{title}"),
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

    fn message(role: &str, content: &str) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role: role.to_string(),
            content: content.to_string(),
            message_metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_jobs_orders_by_similarity_and_truncates() {
        let query = vec![1.0, 0.0];
        let jobs: Vec<JobPostingRow> = (0..8)
            .map(|i| {
                let x = 1.0 - i as f32 * 0.1;
                job(&format!("job-{i}"), Some(vec![x, 1.0 - x]))
            })
            .collect();

        let ranked = rank_jobs(&query, &jobs);
        assert_eq!(ranked.len(), TOP_CONTEXT_JOBS);
        assert_eq!(ranked[0].title, "job-0");
        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_rank_jobs_skips_jobs_without_embeddings() {
        let query = vec![1.0, 0.0];
        let jobs = vec![job("with", Some(vec![1.0, 0.0])), job("without", None)];
        let ranked = rank_jobs(&query, &jobs);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "with");
    }

    #[test]
    fn test_rank_jobs_snippets_are_bounded() {
        let query = vec![1.0, 0.0];
        let ranked = rank_jobs(&query, &[job("a", Some(vec![1.0, 0.0]))]);
        assert_eq!(ranked[0].snippet.chars().count(), SNIPPET_CHARS);
    }

    #[test]
    fn test_build_prompt_includes_last_five_turns_only() {
        let history: Vec<MessageRow> = (0..8)
            .map(|i| message(if i % 2 == 0 { "user" } else { "assistant" }, &format!("turn-{i}")))
            .collect();
        let prompt = build_prompt("What next?", &history, &[]);
        assert!(!prompt.contains("turn-2"));
        assert!(prompt.contains("turn-3"));
        assert!(prompt.contains("turn-7"));
        assert!(prompt.contains("What next?"));
    }

    #[test]
    fn test_build_prompt_lists_relevant_jobs() {
        let jobs = vec![RelevantJob {
            title: "Rust Engineer".to_string(),
            company: "Ferris Labs".to_string(),
            snippet: "Async services".to_string(),
            similarity: 0.9,
        }];
        let prompt = build_prompt("Any rust roles?", &[], &jobs);
        assert!(prompt.contains("Rust Engineer at Ferris Labs: Async services"));
    }

    #[test]
    fn test_build_prompt_omits_job_section_when_empty() {
        let prompt = build_prompt("Hello", &[], &[]);
        assert!(!prompt.contains("Relevant job opportunities"));
    }
}
