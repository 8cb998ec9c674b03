//! Skill-gap analysis — compares a user's skills against one job's
//! requirements and asks the LLM for a structured narrative.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::heuristics::SkillTables;
use crate::llm_client::LlmClient;
use crate::models::job::JobPostingRow;
use crate::models::user::UserRow;
use crate::skills::normalize_skill;

const GAP_SYSTEM: &str = "You are a career advisor analyzing skill gaps. \
    Respond with a JSON object with keys: analysis (string), \
    recommendations (array of strings), priority_skills (array of strings).";

/// Matches the first embedded JSON object in an LLM response that may wrap
/// it in prose or fences.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

#[derive(Debug, Serialize)]
pub struct GapAnalysis {
    pub match_percentage: f32,
    pub skills_matched: usize,
    pub skills_missing: usize,
    pub total_required: usize,
    pub analysis: String,
    pub priority_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillGapReport {
    pub job_id: uuid::Uuid,
    pub job_title: String,
    pub job_company: String,
    pub user_skills: Vec<String>,
    pub job_required_skills: Vec<String>,
    pub user_has_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skill_gap_analysis: GapAnalysis,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GapNarrative {
    analysis: Option<String>,
    recommendations: Option<Vec<String>>,
    priority_skills: Option<Vec<String>>,
}

/// Splits a job's required skills into matched/missing against the user's
/// set, comparing normalized keys but returning the job's display strings.
pub fn compute_gap(
    user_skills: &[String],
    job_skills: &[String],
    tables: &SkillTables,
) -> (Vec<String>, Vec<String>) {
    let user_set: std::collections::HashSet<String> = user_skills
        .iter()
        .map(|s| normalize_skill(s, tables))
        .filter(|s| !s.is_empty())
        .collect();

    let mut has = Vec::new();
    let mut missing = Vec::new();
    for skill in job_skills {
        if user_set.contains(&normalize_skill(skill, tables)) {
            has.push(skill.clone());
        } else {
            missing.push(skill.clone());
        }
    }
    (has, missing)
}

pub fn match_percentage(matched: usize, required: usize) -> f32 {
    if required == 0 {
        0.0
    } else {
        matched as f32 / required as f32 * 100.0
    }
}

/// Full analysis for one user/job pair. LLM failures degrade to a
/// synthesized summary; the endpoint never fails on the narrative.
pub async fn analyze_skill_gap(
    llm: &LlmClient,
    tables: &SkillTables,
    user: &UserRow,
    job: &JobPostingRow,
) -> SkillGapReport {
    let (user_has_skills, missing_skills) =
        compute_gap(&user.skills, &job.required_skills, tables);
    let pct = match_percentage(user_has_skills.len(), job.required_skills.len());

    let prompt = gap_prompt(&user.skills, &job.required_skills, &user_has_skills, &missing_skills, pct);
    let (analysis, recommendations, priority_skills) = match llm.call(&prompt, GAP_SYSTEM, 0.7, 500).await {
        Ok(response) => parse_narrative(&response, &missing_skills),
        Err(e) => {
            warn!("Gap analysis generation failed for job {}: {e}", job.id);
            (
                format!(
                    "Match: {pct:.1}%. Missing skills: {}",
                    missing_skills.iter().take(10).cloned().collect::<Vec<_>>().join(", ")
                ),
                first_n(&missing_skills, 5),
                first_n(&missing_skills, 5),
            )
        }
    };

    SkillGapReport {
        job_id: job.id,
        job_title: job.title.clone(),
        job_company: job.company.clone(),
        user_skills: user.skills.clone(),
        job_required_skills: job.required_skills.clone(),
        skill_gap_analysis: GapAnalysis {
            match_percentage: pct,
            skills_matched: user_has_skills.len(),
            skills_missing: missing_skills.len(),
            total_required: job.required_skills.len(),
            analysis,
            priority_skills,
        },
        user_has_skills,
        missing_skills,
        recommendations,
    }
}

/// Extracts `{analysis, recommendations, priority_skills}` from an LLM
/// response; falls back to the raw text plus the first missing skills when
/// no parsable JSON object is embedded.
fn parse_narrative(response: &str, missing: &[String]) -> (String, Vec<String>, Vec<String>) {
    if let Some(m) = JSON_OBJECT.find(response) {
        if let Ok(parsed) = serde_json::from_str::<GapNarrative>(m.as_str()) {
            let analysis = parsed.analysis.unwrap_or_else(|| response.to_string());
            let recommendations = parsed.recommendations.unwrap_or_else(|| first_n(missing, 5));
            let priority = parsed
                .priority_skills
                .unwrap_or_else(|| first_n(&recommendations, 5));
            return (analysis, recommendations, priority);
        }
    }
    (response.to_string(), first_n(missing, 5), first_n(missing, 5))
}

fn first_n(items: &[String], n: usize) -> Vec<String> {
    items.iter().take(n).cloned().collect()
}

fn gap_prompt(
    user_skills: &[String],
    required: &[String],
    has: &[String],
    missing: &[String],
    pct: f32,
) -> String {
    format!(
        "Analyze the skill gap for a job application:\n\n\
         User's Current Skills: {}\n\
         Job Required Skills: {}\n\
         Skills User Has: {}\n\
         Missing Skills: {}\n\
         Match Percentage: {pct:.1}%\n\n\
         Provide:\n\
         1. A brief analysis of the skill gap\n\
         2. Top 5 actionable recommendations to bridge the gap\n\
         3. Priority skills to learn first\n\n\
         Format as JSON with keys: analysis, recommendations (array), priority_skills (array)",
        joined(user_skills),
        joined(required),
        joined(has),
        joined(missing),
    )
}

fn joined(items: &[String]) -> String {
    items.iter().take(20).cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristics;

    fn tables() -> SkillTables {
        Heuristics::default().skills
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compute_gap_splits_matched_and_missing() {
        let (has, missing) = compute_gap(
            &strings(&["Python", "AWS"]),
            &strings(&["python", "docker", "aws"]),
            &tables(),
        );
        assert_eq!(has, strings(&["python", "aws"]));
        assert_eq!(missing, strings(&["docker"]));
    }

    #[test]
    fn test_compute_gap_uses_normalized_comparison() {
        let (has, missing) = compute_gap(
            &strings(&["Node.js"]),
            &strings(&["nodejs", "TypeScript"]),
            &tables(),
        );
        assert_eq!(has, strings(&["nodejs"]));
        assert_eq!(missing, strings(&["TypeScript"]));
    }

    #[test]
    fn test_match_percentage_zero_when_nothing_required() {
        assert_eq!(match_percentage(0, 0), 0.0);
        assert_eq!(match_percentage(1, 2), 50.0);
    }

    #[test]
    fn test_parse_narrative_extracts_embedded_json() {
        let response = r#"Here is my analysis:
            {"analysis": "Solid base", "recommendations": ["Learn Docker"], "priority_skills": ["Docker"]}
            Good luck!"#;
        let (analysis, recs, priority) = parse_narrative(response, &strings(&["Docker", "Kafka"]));
        assert_eq!(analysis, "Solid base");
        assert_eq!(recs, strings(&["Learn Docker"]));
        assert_eq!(priority, strings(&["Docker"]));
    }

    #[test]
    fn test_parse_narrative_falls_back_to_raw_text() {
        let response = "You should focus on containers first.";
        let missing = strings(&["Docker", "Kafka", "Spark", "Airflow", "Terraform", "Ansible"]);
        let (analysis, recs, priority) = parse_narrative(response, &missing);
        assert_eq!(analysis, response);
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0], "Docker");
        assert_eq!(priority.len(), 5);
    }

    #[test]
    fn test_parse_narrative_partial_json_fills_defaults() {
        let response = r#"{"analysis": "Close match"}"#;
        let missing = strings(&["Kafka"]);
        let (analysis, recs, _) = parse_narrative(response, &missing);
        assert_eq!(analysis, "Close match");
        assert_eq!(recs, strings(&["Kafka"]));
    }
}
