//! UseCase 層のエラー定義
//!
//! Domain 層のエラーを、境界で扱う 6 種類のエラーに集約します。

use thiserror::Error;

use crate::domain::{InvitationError, RepositoryError, SessionError, ValueObjectError};

/// コーディネーター操作のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl UseCaseError {
    pub fn session_not_found() -> Self {
        UseCaseError::NotFound("Session not found".to_string())
    }
}

impl From<SessionError> for UseCaseError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::NotParticipant(_) | SessionError::NotHost(_) => {
                UseCaseError::Forbidden(message)
            }
            SessionError::InvalidSessionStatus { .. }
            | SessionError::GameNotStarted
            | SessionError::InvalidGameStatus { .. }
            | SessionError::GameFinished
            | SessionError::FlashcardNotActive { .. } => UseCaseError::Conflict(message),
            SessionError::EmptyDeck => UseCaseError::FailedPrecondition(message),
            SessionError::UnknownAnswer { .. } => UseCaseError::BadRequest(message),
        }
    }
}

impl From<ValueObjectError> for UseCaseError {
    fn from(err: ValueObjectError) -> Self {
        UseCaseError::BadRequest(err.to_string())
    }
}

impl From<InvitationError> for UseCaseError {
    fn from(err: InvitationError) -> Self {
        let message = err.to_string();
        match err {
            InvitationError::AlreadyResolved(_) => UseCaseError::Conflict(message),
            InvitationError::NotInvitee(_) => UseCaseError::Forbidden(message),
        }
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(err: RepositoryError) -> Self {
        let message = err.to_string();
        match err {
            RepositoryError::JoinCodeTaken(_) | RepositoryError::DuplicateSession(_) => {
                UseCaseError::Conflict(message)
            }
            RepositoryError::CatalogUnavailable(_) => UseCaseError::Internal(message),
        }
    }
}
