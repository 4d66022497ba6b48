//! Chat endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    domain::SessionId,
    infrastructure::dto::http::{ChatMessageDto, ChatRequest, ChatSentResponse},
    ui::{
        error::ApiError,
        extractor::{ApiJson, AuthUser},
        state::AppState,
    },
};

pub async fn send_chat(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatSentResponse>, ApiError> {
    let session_id = SessionId::new(req.session_id)?;
    let message = state.chat.send(&user, &session_id, req.message).await?;
    Ok(Json(ChatSentResponse {
        id: message.id.value(),
        sent_at: message.sent_at.to_rfc3339(),
    }))
}

pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessageDto>>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let messages = state.chat.history(&user, &session_id).await?;
    Ok(Json(messages.iter().map(ChatMessageDto::from).collect()))
}
