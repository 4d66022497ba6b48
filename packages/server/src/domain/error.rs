//! Domain layer error definitions.

use thiserror::Error;

use super::{
    game::GameStatus,
    session::SessionStatus,
    value_object::{AnswerId, FlashcardId, JoinCode, SessionId, UserId},
};

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// Username validation error
    #[error("Username cannot be empty")]
    UsernameEmpty,

    /// Username too long error
    #[error("Username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// SessionId validation error
    #[error("SessionId cannot be empty")]
    SessionIdEmpty,

    /// SessionId invalid format error (not a valid UUID format)
    #[error("SessionId must be a valid UUID format (got: {0})")]
    SessionIdInvalidFormat(String),

    /// JoinCode invalid format error
    #[error("JoinCode must be {length} characters from [A-Z0-9] (got: {actual})")]
    JoinCodeInvalidFormat { length: usize, actual: String },

    /// GroupName validation error
    #[error("GroupName cannot be empty")]
    GroupNameEmpty,

    /// SubjectName validation error
    #[error("SubjectName cannot be empty")]
    SubjectNameEmpty,

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },
}

/// Errors raised by the session aggregate when a transition is not allowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("User {0} is not a participant of this session")]
    NotParticipant(UserId),

    #[error("User {0} is not the host of this session")]
    NotHost(UserId),

    #[error("Session is {actual:?}, expected {expected:?}")]
    InvalidSessionStatus {
        expected: SessionStatus,
        actual: SessionStatus,
    },

    #[error("Game has not been started")]
    GameNotStarted,

    #[error("Game is {actual:?}, expected {expected:?}")]
    InvalidGameStatus {
        expected: GameStatus,
        actual: GameStatus,
    },

    #[error("Game is already finished")]
    GameFinished,

    #[error("Deck is empty")]
    EmptyDeck,

    #[error("Flashcard {requested} is not the active question (active: {active})")]
    FlashcardNotActive {
        requested: FlashcardId,
        active: FlashcardId,
    },

    #[error("Answer {answer} is not an option of flashcard {flashcard}")]
    UnknownAnswer {
        flashcard: FlashcardId,
        answer: AnswerId,
    },
}

/// Errors related to Invitation domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvitationError {
    #[error("Invitation was already {0}")]
    AlreadyResolved(&'static str),

    #[error("User {0} is not the invitee")]
    NotInvitee(UserId),
}

/// Errors raised by storage and catalog implementations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Join code {0} is already used by an active session")]
    JoinCodeTaken(JoinCode),

    #[error("Session {0} already exists")]
    DuplicateSession(SessionId),

    #[error("Catalog is unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Errors raised while resolving a bearer credential
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingToken,

    #[error("Invalid credential: {0}")]
    InvalidToken(String),

    #[error("Credential has expired")]
    Expired,

    #[error("User {0} is unknown")]
    UnknownUser(UserId),
}
