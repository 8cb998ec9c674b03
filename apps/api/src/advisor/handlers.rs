use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::advisor::respond;
use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::models::conversation::{ConversationRow, MessageRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub content: String,
    pub conversation_id: Option<Uuid>,
}

/// POST /api/chat/message
pub async fn handle_send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChatMessageRequest>,
) -> Result<Json<Value>, AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Message content is required".to_string()));
    }

    let conversation = match req.conversation_id {
        Some(id) => {
            sqlx::query_as::<_, ConversationRow>(
                "SELECT * FROM conversations WHERE id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?
        }
        None => None,
    };

    let conversation = match conversation {
        Some(c) => c,
        None => {
            let title: String = req.content.chars().take(50).collect();
            sqlx::query_as::<_, ConversationRow>(
                "INSERT INTO conversations (id, user_id, title) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(title)
            .fetch_one(&state.db)
            .await?
        }
    };

    sqlx::query("INSERT INTO messages (id, conversation_id, role, content) VALUES ($1, $2, 'user', $3)")
        .bind(Uuid::new_v4())
        .bind(conversation.id)
        .bind(&req.content)
        .execute(&state.db)
        .await?;

    // History is read back from storage so the window always reflects what
    // was actually persisted.
    let history: Vec<MessageRow> = sqlx::query_as(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at",
    )
    .bind(conversation.id)
    .fetch_all(&state.db)
    .await?;

    let response_text = respond(&state.db, &state.embeddings, &state.llm, &req.content, &history).await?;

    let assistant_msg: MessageRow = sqlx::query_as(
        "INSERT INTO messages (id, conversation_id, role, content) \
         VALUES ($1, $2, 'assistant', $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(conversation.id)
    .bind(&response_text)
    .fetch_one(&state.db)
    .await?;

    sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(conversation.id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({
        "conversation_id": conversation.id,
        "message": {
            "id": assistant_msg.id,
            "role": assistant_msg.role,
            "content": assistant_msg.content,
            "created_at": assistant_msg.created_at,
        }
    })))
}

/// GET /api/chat/conversations
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let rows: Vec<(Uuid, Option<String>, chrono::DateTime<Utc>, chrono::DateTime<Utc>, i64)> =
        sqlx::query_as(
            r#"
            SELECT c.id, c.title, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
            FROM conversations c
            WHERE c.user_id = $1
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;

    let conversations: Vec<Value> = rows
        .into_iter()
        .map(|(id, title, created_at, updated_at, message_count)| {
            json!({
                "id": id,
                "title": title,
                "created_at": created_at,
                "updated_at": updated_at,
                "message_count": message_count,
            })
        })
        .collect();

    Ok(Json(json!({ "conversations": conversations })))
}

/// GET /api/chat/conversations/:id/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let conversation: Option<ConversationRow> = sqlx::query_as(
        "SELECT * FROM conversations WHERE id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    if conversation.is_none() {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }

    let messages: Vec<MessageRow> = sqlx::query_as(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at",
    )
    .bind(conversation_id)
    .fetch_all(&state.db)
    .await?;

    let messages: Vec<Value> = messages
        .into_iter()
        .map(|m| {
            json!({
                "id": m.id,
                "role": m.role,
                "content": m.content,
                "created_at": m.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "messages": messages })))
}
