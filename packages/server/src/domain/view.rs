//! Read models built from the session aggregate.
//!
//! These are what events and snapshot endpoints carry. None of them exposes a
//! per-answer correctness flag unless the question has been closed.

use serde::{Deserialize, Serialize};

use super::{
    entity::{Participant, User},
    game::{GameState, QuestionOutcome, SanitizedQuestion},
    session::{Session, SessionStatus},
    value_object::{AnswerId, GroupName, JoinCode, SessionId, SubjectName, Timestamp, UserId, Username},
};

/// Public identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub user_id: UserId,
    pub username: Username,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub user_id: UserId,
    pub username: Username,
    pub is_host: bool,
    pub joined_at: Timestamp,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        Self {
            user_id: p.user.id,
            username: p.user.username.clone(),
            is_host: p.is_host,
            joined_at: p.joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub join_code: JoinCode,
    pub host: Option<UserRef>,
    pub group: GroupName,
    pub subject: SubjectName,
    pub status: SessionStatus,
    pub flashcard_count: usize,
    pub created_at: Timestamp,
    pub participants: Vec<ParticipantView>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            join_code: session.join_code.clone(),
            host: session.host().map(|p| UserRef::from(&p.user)),
            group: session.group().clone(),
            subject: session.subject.name.clone(),
            status: session.status,
            flashcard_count: session.flashcard_count,
            created_at: session.created_at,
            participants: session.participant_views(),
        }
    }
}

/// Consistent view of a session and, once started, its game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session: SessionView,
    pub game: Option<GameState>,
    pub question: Option<SanitizedQuestion>,
    /// Set only when the current question has been closed.
    pub correct_answer_id: Option<AnswerId>,
    /// Set only when the current question has been closed.
    pub outcome: Option<QuestionOutcome>,
}
