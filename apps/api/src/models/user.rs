use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub resume_text: Option<String>,
    /// Resume embedding, persisted as a JSONB float array. Regenerated
    /// lazily by the recommendation pipeline when absent.
    pub resume_embedding: Option<Json<Vec<f32>>>,
    pub skills: Vec<String>,
    pub experience_years: Option<String>,
    pub education_level: Option<String>,
    pub preferred_locations: Vec<String>,
    pub preferred_job_types: Vec<String>,
    pub onboarding_completed: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Profile text used to regenerate the resume embedding when no stored
    /// vector exists.
    pub fn profile_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(resume) = &self.resume_text {
            parts.push(resume.clone());
        }
        if !self.skills.is_empty() {
            parts.push(format!("Skills: {}", self.skills.join(", ")));
        }
        if let Some(exp) = &self.experience_years {
            parts.push(format!("Experience: {exp} years"));
        }
        if let Some(edu) = &self.education_level {
            parts.push(format!("Education: {edu}"));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(resume: Option<&str>, skills: &[&str]) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            hashed_password: "x".to_string(),
            full_name: None,
            resume_text: resume.map(str::to_string),
            resume_embedding: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: Some("3-5".to_string()),
            education_level: Some("Master's".to_string()),
            preferred_locations: vec![],
            preferred_job_types: vec![],
            onboarding_completed: true,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_profile_text_combines_available_fields() {
        let u = user(Some("Built backend services."), &["Python", "AWS"]);
        let text = u.profile_text();
        assert!(text.contains("Built backend services."));
        assert!(text.contains("Skills: Python, AWS"));
        assert!(text.contains("Experience: 3-5 years"));
        assert!(text.contains("Education: Master's"));
    }

    #[test]
    fn test_profile_text_skips_missing_fields() {
        let mut u = user(None, &[]);
        u.experience_years = None;
        u.education_level = None;
        assert!(u.profile_text().is_empty());
    }
}
