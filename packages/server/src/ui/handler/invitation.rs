//! Invitation endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    domain::{InvitationId, SessionId, Username},
    infrastructure::dto::http::{AcceptInvitationResponse, InvitationDto, SendInvitationRequest, SessionEnvelopeDto},
    ui::{
        error::ApiError,
        extractor::{ApiJson, AuthUser},
        state::AppState,
    },
};

pub async fn send_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<SendInvitationRequest>,
) -> Result<Json<InvitationDto>, ApiError> {
    let session_id = SessionId::new(req.session_id)?;
    let invitee = Username::new(req.invitee_username)?;
    let invitation = state.invitations.send(&user, &session_id, invitee).await?;
    Ok(Json(InvitationDto::from(&invitation)))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<AcceptInvitationResponse>, ApiError> {
    let (invitation, view) = state.invitations.accept(&user, InvitationId::new(id)).await?;
    Ok(Json(AcceptInvitationResponse {
        invitation: InvitationDto::from(&invitation),
        session: SessionEnvelopeDto::from(&view),
    }))
}

pub async fn reject_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<InvitationDto>, ApiError> {
    let invitation = state.invitations.reject(&user, InvitationId::new(id)).await?;
    Ok(Json(InvitationDto::from(&invitation)))
}

pub async fn pending_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Json<Vec<InvitationDto>> {
    let pending = state.invitations.pending(&user).await;
    Json(pending.iter().map(InvitationDto::from).collect())
}
