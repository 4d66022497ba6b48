//! Events pushed to connected clients.
//!
//! One variant per entry of the push vocabulary. The fan-out layer only needs
//! them to be serializable; it never inspects the variant.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    game::{GameResult, GameState, QuestionOutcome, SanitizedQuestion, VoteEntry},
    session::SessionStatus,
    value_object::{
        AnswerId, ChatMessageId, FlashcardId, GroupName, InvitationId, SessionId, SubjectName,
        Timestamp, UserId, Username,
    },
    view::{ParticipantView, UserRef},
};

/// Why a session was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    HostLeft,
    Expired,
}

/// Scope of an `online_users_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceScope {
    Group,
    Room,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ParticipantJoined {
        session_id: SessionId,
        participant: ParticipantView,
    },
    ParticipantLeft {
        session_id: SessionId,
        user_id: UserId,
        username: Username,
    },
    HostChanged {
        session_id: SessionId,
        previous_host_id: UserId,
        new_host: UserRef,
    },
    SessionClosed {
        session_id: SessionId,
        reason: CloseReason,
    },
    LobbyUpdate {
        session_id: SessionId,
        status: SessionStatus,
        participants: Vec<ParticipantView>,
    },
    GameStarted {
        session_id: SessionId,
        game: GameState,
        question: SanitizedQuestion,
        /// Roster at start; the session room is limited to these users from here on.
        participants: Vec<ParticipantView>,
    },
    VoteUpdate {
        session_id: SessionId,
        flashcard_id: FlashcardId,
        tally: BTreeMap<AnswerId, u32>,
        votes: Vec<VoteEntry>,
        total_votes: usize,
    },
    QuestionEnded {
        session_id: SessionId,
        outcome: QuestionOutcome,
    },
    NextQuestion {
        session_id: SessionId,
        question: SanitizedQuestion,
        total_score: u32,
    },
    GameFinished {
        session_id: SessionId,
        result: GameResult,
    },
    ChatMessage {
        session_id: SessionId,
        id: ChatMessageId,
        user_id: UserId,
        username: Username,
        message: String,
        sent_at: Timestamp,
    },
    OnlineUsersUpdate {
        scope: PresenceScope,
        name: String,
        users: Vec<UserRef>,
    },
    NewInvitation {
        invitation_id: InvitationId,
        session_id: SessionId,
        inviter: UserRef,
        group: GroupName,
        subject: SubjectName,
    },
}

impl Event {
    /// The `type` tag this event serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ParticipantJoined { .. } => "participant_joined",
            Event::ParticipantLeft { .. } => "participant_left",
            Event::HostChanged { .. } => "host_changed",
            Event::SessionClosed { .. } => "session_closed",
            Event::LobbyUpdate { .. } => "lobby_update",
            Event::GameStarted { .. } => "game_started",
            Event::VoteUpdate { .. } => "vote_update",
            Event::QuestionEnded { .. } => "question_ended",
            Event::NextQuestion { .. } => "next_question",
            Event::GameFinished { .. } => "game_finished",
            Event::ChatMessage { .. } => "chat_message",
            Event::OnlineUsersUpdate { .. } => "online_users_update",
            Event::NewInvitation { .. } => "new_invitation",
        }
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    User(UserId),
    Group(GroupName),
    Room(SessionId),
}

/// Non-blocking hand-off of events to the fan-out layer.
///
/// Implementations must not block or await: the coordinator calls this while
/// holding a session lock so that events leave in the order the state changed.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    fn publish(&self, audience: Audience, event: Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_tag_matches_kind() {
        // テスト項目: シリアライズされた type タグが kind() と一致する
        // given (前提条件):
        let event = Event::SessionClosed {
            session_id: SessionId::from_uuid(uuid::Uuid::nil()),
            reason: CloseReason::HostLeft,
        };

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], event.kind());
        assert_eq!(value["reason"], "host_left");
    }

    #[test]
    fn test_online_users_update_shape() {
        let event = Event::OnlineUsersUpdate {
            scope: PresenceScope::Group,
            name: "biology".to_string(),
            users: vec![UserRef {
                user_id: UserId::new(1),
                username: Username::new("alice".to_string()).unwrap(),
            }],
        };

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "online_users_update");
        assert_eq!(value["scope"], "group");
        assert_eq!(value["users"][0]["user_id"], 1);
        assert_eq!(value["users"][0]["username"], "alice");
    }
}
