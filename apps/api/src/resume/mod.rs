//! Resume parsing — text extraction from uploaded files plus an LLM
//! structured parse with a keyword-matching fallback.

use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::heuristics::SkillTables;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::skills::extract_skills;

/// The LLM only sees the head of long resumes.
const PARSE_TEXT_LIMIT: usize = 3000;

const RESUME_PARSE_SYSTEM: &str = "You are an expert resume parser. Extract structured \
    information from resumes. Return a JSON object with the following fields:\n\
    - full_name: string\n\
    - email: string (if found)\n\
    - phone: string (if found)\n\
    - skills: array of skill names\n\
    - experience_years: string (e.g., \"2-3 years\", \"5+ years\")\n\
    - education_level: string (e.g., \"Bachelor's\", \"Master's\", \"PhD\")\n\
    - summary: string (professional summary if available)";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedResume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_years: Option<String>,
    pub education_level: Option<String>,
    pub summary: Option<String>,
}

/// Extracts plain text from an uploaded resume based on its extension.
/// PDF and plain text are supported; anything else is a validation error.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Validation(format!("Error reading PDF: {e}"))),
        "txt" => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::Validation("Resume text is not valid UTF-8".to_string())),
        other => Err(AppError::Validation(format!(
            "Unsupported file format: .{other}"
        ))),
    }
}

/// Parses resume text with the LLM; on any LLM failure falls back to
/// vocabulary keyword extraction so an upload always yields something.
pub async fn parse_resume(
    llm: &LlmClient,
    tables: &SkillTables,
    resume_text: &str,
) -> ParsedResume {
    let head: String = resume_text.chars().take(PARSE_TEXT_LIMIT).collect();
    let prompt = format!("Parse this resume and extract the information:\n\n{head}");
    let system = format!("{RESUME_PARSE_SYSTEM}\n\n{JSON_ONLY_SYSTEM}");

    match llm.call_json::<ParsedResume>(&prompt, &system, 0.3, 2000).await {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("LLM resume parse failed, falling back to keyword extraction: {e}");
            ParsedResume {
                skills: extract_skills(resume_text, tables),
                ..Default::default()
            }
        }
    }
}
