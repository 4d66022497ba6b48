//! Game endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    domain::{AdvanceStep, AnswerId, FlashcardId, GameResult, SessionId},
    infrastructure::dto::http::{
        GameStartResponse, NextQuestionResponse, QuestionEndedResponse, SnapshotResponse,
        VoteRequest, VoteResponse,
    },
    ui::{
        error::ApiError,
        extractor::{ApiJson, AuthUser},
        state::AppState,
    },
};

pub async fn start_game(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<GameStartResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let started = state.game.start(&user, &session_id).await?;
    Ok(Json(GameStartResponse {
        session_id: session_id.as_str().to_string(),
        game: started.game,
        question: started.question,
    }))
}

pub async fn vote(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let session_id = SessionId::new(req.session_id)?;
    let vote_id = state
        .game
        .cast_vote(
            &user,
            &session_id,
            FlashcardId::new(req.flashcard_id),
            AnswerId::new(req.answer_id),
        )
        .await?;
    Ok(Json(VoteResponse {
        vote_id: vote_id.value(),
    }))
}

pub async fn end_question(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<QuestionEndedResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let outcome = state.game.end_current_question(&user, &session_id).await?;
    Ok(Json(QuestionEndedResponse {
        session_id: session_id.as_str().to_string(),
        outcome,
    }))
}

pub async fn next_question(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<NextQuestionResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let outcome = state.game.advance(&user, &session_id).await?;
    let response = match outcome.step {
        AdvanceStep::Next {
            question,
            total_score,
        } => NextQuestionResponse::NextQuestion {
            ended: outcome.ended,
            question,
            total_score,
        },
        AdvanceStep::Finished(result) => NextQuestionResponse::Finished {
            ended: outcome.ended,
            result,
        },
    };
    Ok(Json(response))
}

pub async fn game_state(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    let snapshot = state.game.get_state(&user, &session_id).await?;
    Ok(Json(SnapshotResponse::from(&snapshot)))
}

pub async fn game_result(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<GameResult>, ApiError> {
    let session_id = SessionId::new(session_id)?;
    Ok(Json(state.game.result(&user, &session_id).await?))
}
