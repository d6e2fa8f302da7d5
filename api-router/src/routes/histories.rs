use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use common::storage::types::{
    conversation::Conversation,
    message::{Message, MessageRole},
    user::User,
};
use serde::Serialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history_id: String,
    pub chat_name: String,
    pub messages: Vec<MessageView>,
}

/// Archive listing: id, derived chat name and last activity, newest first.
pub async fn list_histories(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = Conversation::list_for_user(&user.id, &state.db).await?;
    Ok(Json(summaries))
}

pub async fn get_history(
    Path(history_id): Path<String>,
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = Conversation::get_owned(&history_id, &user.id, &state.db).await?;
    let messages = Conversation::get_messages(&conversation.id, &state.db).await?;

    Ok(Json(HistoryResponse {
        history_id: conversation.id,
        chat_name: Conversation::chat_name(&messages),
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// Explicit "new chat": an empty conversation the next query can target.
pub async fn create_history(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = Conversation::new(user.id);
    state
        .db
        .store_item(conversation.clone())
        .await
        .map_err(common::error::AppError::from)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "history_id": conversation.id })),
    ))
}

pub async fn delete_history(
    Path(history_id): Path<String>,
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    Conversation::delete_owned(&history_id, &user.id, &state.db).await?;

    Ok((StatusCode::OK, Json(json!({ "status": "success" }))))
}
