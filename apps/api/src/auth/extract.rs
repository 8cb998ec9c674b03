//! Axum extractors resolving the bearer token to a user row.

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

use crate::auth::extract_bearer_token;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// Authenticated user. Rejects with 401 when the token is missing, invalid,
/// or names a user that no longer exists.
pub struct AuthUser(pub UserRow);

/// Optional variant for endpoints that adapt to an authenticated caller but
/// do not require one (e.g. `is_saved` flags on job listings).
pub struct OptionalAuthUser(pub Option<UserRow>);

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<UserRow, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let token = extract_bearer_token(header).ok_or(AppError::Unauthorized)?;
    let user_id = state
        .tokens
        .verify(token)
        .map_err(|_| AppError::Unauthorized)?;

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    user.ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(AuthUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(resolve_user(parts, state).await.ok()))
    }
}

/// Admin gate used by the admin handlers.
pub fn ensure_admin(user: &UserRow) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(is_admin: bool) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            hashed_password: "x".to_string(),
            full_name: None,
            resume_text: None,
            resume_embedding: None,
            skills: vec![],
            experience_years: None,
            education_level: None,
            preferred_locations: vec![],
            preferred_job_types: vec![],
            onboarding_completed: false,
            is_admin,
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_ensure_admin_allows_admin() {
        assert!(ensure_admin(&user(true)).is_ok());
    }

    #[test]
    fn test_ensure_admin_rejects_non_admin() {
        assert!(matches!(ensure_admin(&user(false)), Err(AppError::Forbidden)));
    }
}
