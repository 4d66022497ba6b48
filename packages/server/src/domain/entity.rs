//! Core domain models shared by the session aggregate and the collaborators.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    error::InvitationError,
    value_object::{
        AnswerId, ChatMessageId, FlashcardId, GroupName, InvitationId, MessageContent, SessionId,
        SubjectId, SubjectName, Timestamp, UserId, Username, VoteId,
    },
};

/// An authenticated user as resolved by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
}

impl User {
    pub fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }
}

/// One of the answer options of a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: AnswerId,
    pub text: String,
    pub is_correct: bool,
}

/// A question with its answer options, exactly one of which is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub question: String,
    pub answers: Vec<AnswerOption>,
}

impl Flashcard {
    /// The id of the correct option, if the card has one.
    pub fn correct_answer_id(&self) -> Option<AnswerId> {
        self.answers.iter().find(|a| a.is_correct).map(|a| a.id)
    }

    /// Whether `answer` is one of this card's options.
    pub fn has_answer(&self, answer: AnswerId) -> bool {
        self.answers.iter().any(|a| a.id == answer)
    }
}

/// A subject (deck) that belongs to one study group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: SubjectName,
    pub group: GroupName,
}

/// A study group and the users who belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: GroupName,
    pub members: BTreeSet<UserId>,
}

impl Group {
    pub fn is_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

/// Represents a participant in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user: User,
    pub is_host: bool,
    /// Timestamp when the participant joined
    pub joined_at: Timestamp,
    /// Individual score, reserved for non-team modes
    pub score: u32,
}

impl Participant {
    pub fn new(user: User, is_host: bool, joined_at: Timestamp) -> Self {
        Self {
            user,
            is_host,
            joined_at,
            score: 0,
        }
    }
}

/// A participant's current choice for a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub user: User,
    pub flashcard_id: FlashcardId,
    pub answer_id: AnswerId,
    pub voted_at: Timestamp,
}

/// Represents a chat message in the domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub from: User,
    pub content: MessageContent,
    pub sent_at: Timestamp,
}

/// Lifecycle of a session invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

/// An invitation for a specific user to enter a specific session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub session_id: SessionId,
    pub inviter: User,
    pub invitee: User,
    pub status: InvitationStatus,
    pub created_at: Timestamp,
}

impl Invitation {
    /// Mark the invitation accepted by `user`.
    ///
    /// Accepting twice is a no-op.
    pub fn accept(&mut self, user: UserId) -> Result<(), InvitationError> {
        self.ensure_invitee(user)?;
        match self.status {
            InvitationStatus::Pending | InvitationStatus::Accepted => {
                self.status = InvitationStatus::Accepted;
                Ok(())
            }
            InvitationStatus::Rejected => Err(InvitationError::AlreadyResolved("rejected")),
        }
    }

    /// Mark the invitation rejected by `user`.
    ///
    /// Rejecting twice is a no-op.
    pub fn reject(&mut self, user: UserId) -> Result<(), InvitationError> {
        self.ensure_invitee(user)?;
        match self.status {
            InvitationStatus::Pending | InvitationStatus::Rejected => {
                self.status = InvitationStatus::Rejected;
                Ok(())
            }
            InvitationStatus::Accepted => Err(InvitationError::AlreadyResolved("accepted")),
        }
    }

    fn ensure_invitee(&self, user: UserId) -> Result<(), InvitationError> {
        if self.invitee.id != user {
            return Err(InvitationError::NotInvitee(user));
        }
        Ok(())
    }
}
