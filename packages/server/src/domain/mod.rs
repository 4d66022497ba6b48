//! Domain layer for the quiz coordinator.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod game;
pub mod repository;
pub mod session;
pub mod value_object;
pub mod view;

pub use entity::{
    AnswerOption, ChatMessage, Flashcard, Group, Invitation, InvitationStatus, Participant,
    Subject, User, Vote,
};
pub use error::{AuthError, InvitationError, RepositoryError, SessionError, ValueObjectError};
pub use event::{Audience, CloseReason, Event, EventPublisher, PresenceScope};
pub use factory::{JoinCodeFactory, SessionIdFactory};
pub use game::{
    GameResult, GameState, GameStatus, GameVerdict, QuestionOutcome, SanitizedAnswer,
    SanitizedQuestion, VoteEntry,
};
pub use repository::{
    Catalog, IdentityProvider, InvitationRepository, InvitationUpdate, SessionHandle,
    SessionRepository,
};
pub use session::{AdvanceOutcome, AdvanceStep, LeaveOutcome, Session, SessionStatus};
pub use value_object::{
    AnswerId, ChatMessageId, FlashcardId, GroupName, InvitationId, JoinCode, MessageContent,
    SessionId, SubjectId, SubjectName, Timestamp, UserId, Username, VoteId,
};
pub use view::{ParticipantView, SessionView, Snapshot, UserRef};

#[cfg(test)]
pub use event::MockEventPublisher;
#[cfg(test)]
pub use repository::MockCatalog;
