use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use common::storage::types::user::User;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub content: String,
    pub history_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub message: String,
    pub history_id: String,
}

/// The pipeline entry point: one query in, one grounded answer out, both
/// persisted to the (possibly freshly created) conversation.
pub async fn ask(
    State(state): State<ApiState>,
    Extension(user): Extension<User>,
    Json(params): Json<AskParams>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        user_id = %user.id,
        content_chars = params.content.chars().count(),
        has_history = params.history_id.is_some(),
        "Received chat query"
    );

    let outcome = state
        .pipeline
        .answer(&user.id, &params.content, params.history_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(AskResponse {
            message: outcome.answer,
            history_id: outcome.conversation_id,
        }),
    ))
}
