pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, advisor, auth, jobs, recommend, users};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        // Jobs
        .route("/api/jobs", get(jobs::handlers::handle_list_jobs))
        .route("/api/jobs/saved/list", get(jobs::handlers::handle_saved_jobs))
        .route("/api/jobs/:job_id", get(jobs::handlers::handle_get_job))
        .route(
            "/api/jobs/:job_id/save",
            post(jobs::handlers::handle_save_job).delete(jobs::handlers::handle_unsave_job),
        )
        // Recommendations
        .route(
            "/api/recommendations",
            get(recommend::handlers::handle_recommendations),
        )
        // Chat
        .route("/api/chat/message", post(advisor::handlers::handle_send_message))
        .route(
            "/api/chat/conversations",
            get(advisor::handlers::handle_list_conversations),
        )
        .route(
            "/api/chat/conversations/:conversation_id/messages",
            get(advisor::handlers::handle_list_messages),
        )
        // User profile
        .route(
            "/api/user/profile",
            get(users::handlers::handle_get_profile).patch(users::handlers::handle_update_profile),
        )
        .route("/api/user/resume", post(users::handlers::handle_upload_resume))
        .route(
            "/api/user/skill-gap/:job_id",
            get(users::handlers::handle_skill_gap),
        )
        // Admin
        .route("/api/admin/stats", get(admin::handlers::handle_stats))
        .route("/api/admin/jobs", get(admin::handlers::handle_list_jobs))
        .route(
            "/api/admin/jobs/scrape",
            post(admin::handlers::handle_trigger_scrape),
        )
        .route(
            "/api/admin/jobs/:job_id",
            get(admin::handlers::handle_job_details)
                .patch(admin::handlers::handle_update_job)
                .delete(admin::handlers::handle_delete_job),
        )
        .route("/api/admin/users", get(admin::handlers::handle_list_users))
        .with_state(state)
}
