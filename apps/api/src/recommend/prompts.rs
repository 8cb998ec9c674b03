//! Prompts for recommendation explanations.

use crate::recommend::ScoredJob;

pub const FALLBACK_EXPLANATION: &str =
    "Good match based on skills and job description similarity.";

pub fn explanation_prompt(entry: &ScoredJob) -> String {
    let skills: Vec<&str> = entry
        .job
        .required_skills
        .iter()
        .take(5)
        .map(String::as_str)
        .collect();

    format!(
        "Explain why this job matches the user:\n\
         Job: {title} at {company}\n\
         Required Skills: {skills}\n\
         Match Score: {combined:.0}%\n\
         Similarity: {similarity:.0}%\n\
         Skills Match: {matched}/{total}\n\n\
         Provide a brief 1-2 sentence explanation.",
        title = entry.job.title,
        company = entry.job.company,
        skills = skills.join(", "),
        combined = entry.combined_score * 100.0,
        similarity = entry.similarity_score * 100.0,
        matched = entry.skill_match_count,
        total = entry.job.required_skills.len(),
    )
}
