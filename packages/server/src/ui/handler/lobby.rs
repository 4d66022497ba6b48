//! Lobby endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{GroupName, JoinCode, SessionId, SubjectName},
    infrastructure::dto::http::{
        CreateLobbyRequest, JoinExistingRequest, JoinLobbyRequest, LobbyStartResponse,
        ParticipantDto, SessionEnvelopeDto, StatusResponse,
    },
    ui::{
        error::ApiError,
        extractor::{ApiJson, AuthUser},
        state::AppState,
    },
};

pub async fn create_lobby(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateLobbyRequest>,
) -> Result<(StatusCode, Json<SessionEnvelopeDto>), ApiError> {
    let subject = SubjectName::new(req.subject_name)?;
    let group = GroupName::new(req.group_name)?;
    let view = state.lobby.create(&user, subject, group).await?;
    Ok((StatusCode::CREATED, Json(SessionEnvelopeDto::from(&view))))
}

pub async fn join_lobby(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<JoinLobbyRequest>,
) -> Result<Json<SessionEnvelopeDto>, ApiError> {
    let code = JoinCode::new(req.join_code)?;
    let view = state.lobby.join_by_code(&user, code).await?;
    Ok(Json(SessionEnvelopeDto::from(&view)))
}

pub async fn join_existing(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<JoinExistingRequest>,
) -> Result<Json<SessionEnvelopeDto>, ApiError> {
    let subject = SubjectName::new(req.subject_name)?;
    let group = GroupName::new(req.group_name)?;
    let view = state.lobby.join_existing_by_subject(&user, subject, group).await?;
    Ok(Json(SessionEnvelopeDto::from(&view)))
}

/// Visiting a lobby URL attaches group members to a waiting session.
pub async fn lobby_details(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionEnvelopeDto>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let view = state.lobby.auto_attach_on_url_visit(&user, &session_id).await?;
    Ok(Json(SessionEnvelopeDto::from(&view)))
}

pub async fn lobby_participants(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let participants = state.lobby.participants(&user, &session_id).await?;
    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

pub async fn leave_lobby(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    state.lobby.leave(&user, &session_id).await?;
    state.presence.leave_session_room(user.id, &session_id).await;
    Ok(Json(StatusResponse::left()))
}

pub async fn start_from_lobby(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<LobbyStartResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    state.game.start(&user, &session_id).await?;
    Ok(Json(LobbyStartResponse {
        status: "started".to_string(),
        game_id: session_id.as_str().to_string(),
    }))
}
