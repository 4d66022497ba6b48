//! HTTP API request and response DTOs.
//!
//! Requests carry raw strings and numbers; handlers turn them into value
//! objects. Timestamps leave the server as RFC 3339 strings.

use serde::{Deserialize, Serialize};

use crate::domain::{
    ChatMessage, GameResult, GameState, Invitation, ParticipantView, QuestionOutcome,
    SanitizedQuestion, SessionStatus, SessionView, Snapshot, UserRef,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLobbyRequest {
    pub subject_name: String,
    pub group_name: String,
}

/// Body of `POST /lobby/join-existing`; same shape as create.
pub type JoinExistingRequest = CreateLobbyRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinLobbyRequest {
    pub join_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub session_id: String,
    pub flashcard_id: i64,
    pub answer_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendInvitationRequest {
    pub session_id: String,
    pub invitee_username: String,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub user_id: i64,
    pub username: String,
    pub is_host: bool,
    pub joined_at: String, // RFC 3339
}

impl From<&ParticipantView> for ParticipantDto {
    fn from(p: &ParticipantView) -> Self {
        Self {
            user_id: p.user_id.value(),
            username: p.username.as_str().to_string(),
            is_host: p.is_host,
            joined_at: p.joined_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub user_id: i64,
    pub username: String,
}

impl From<&UserRef> for UserDto {
    fn from(user: &UserRef) -> Self {
        Self {
            user_id: user.user_id.value(),
            username: user.username.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummaryDto {
    pub id: String,
    pub join_code: String,
    pub host: Option<UserDto>,
    pub group: String,
    pub subject: String,
    pub status: SessionStatus,
    pub flashcard_count: usize,
    pub created_at: String, // RFC 3339
}

/// Body returned by create, join and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelopeDto {
    pub session: SessionSummaryDto,
    pub participants: Vec<ParticipantDto>,
}

impl From<&SessionView> for SessionEnvelopeDto {
    fn from(view: &SessionView) -> Self {
        Self {
            session: SessionSummaryDto {
                id: view.id.as_str().to_string(),
                join_code: view.join_code.as_str().to_string(),
                host: view.host.as_ref().map(UserDto::from),
                group: view.group.as_str().to_string(),
                subject: view.subject.as_str().to_string(),
                status: view.status,
                flashcard_count: view.flashcard_count,
                created_at: view.created_at.to_rfc3339(),
            },
            participants: view.participants.iter().map(ParticipantDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn left() -> Self {
        Self {
            status: "left".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyStartResponse {
    pub status: String,
    pub game_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStartResponse {
    pub session_id: String,
    pub game: GameState,
    pub question: SanitizedQuestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub vote_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionEndedResponse {
    pub session_id: String,
    pub outcome: QuestionOutcome,
}

/// Body of `POST /game/next-question/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextQuestionResponse {
    NextQuestion {
        ended: Option<QuestionOutcome>,
        question: SanitizedQuestion,
        total_score: u32,
    },
    Finished {
        ended: Option<QuestionOutcome>,
        result: GameResult,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub session: SessionEnvelopeDto,
    pub game: Option<GameState>,
    pub question: Option<SanitizedQuestion>,
    pub correct_answer_id: Option<i64>,
    pub outcome: Option<QuestionOutcome>,
}

impl From<&Snapshot> for SnapshotResponse {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            session: SessionEnvelopeDto::from(&snapshot.session),
            game: snapshot.game.clone(),
            question: snapshot.question.clone(),
            correct_answer_id: snapshot.correct_answer_id.map(|id| id.value()),
            outcome: snapshot.outcome.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSentResponse {
    pub id: u64,
    pub sent_at: String, // RFC 3339
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: u64,
    pub user_id: i64,
    pub username: String,
    pub message: String,
    pub sent_at: String, // RFC 3339
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.value(),
            user_id: message.from.id.value(),
            username: message.from.username.as_str().to_string(),
            message: message.content.as_str().to_string(),
            sent_at: message.sent_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationDto {
    pub id: i64,
    pub session_id: String,
    pub inviter: UserDto,
    pub invitee: UserDto,
    pub status: String,
    pub created_at: String, // RFC 3339
}

impl From<&Invitation> for InvitationDto {
    fn from(invitation: &Invitation) -> Self {
        Self {
            id: invitation.id.value(),
            session_id: invitation.session_id.as_str().to_string(),
            inviter: UserDto::from(&UserRef::from(&invitation.inviter)),
            invitee: UserDto::from(&UserRef::from(&invitation.invitee)),
            status: invitation.status.as_str().to_string(),
            created_at: invitation.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    pub invitation: InvitationDto,
    pub session: SessionEnvelopeDto,
}

/// Error body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GroupName, JoinCode, SessionIdFactory, SubjectName, Timestamp, UserId, Username,
    };

    #[test]
    fn test_session_envelope_uses_rfc3339() {
        // テスト項目: セッション情報のタイムスタンプが RFC 3339 文字列で返る
        // given (前提条件):
        let alice = UserRef {
            user_id: UserId::new(1),
            username: Username::new("alice".to_string()).unwrap(),
        };
        let view = SessionView {
            id: SessionIdFactory::generate(),
            join_code: JoinCode::new("ABC123".to_string()).unwrap(),
            host: Some(alice.clone()),
            group: GroupName::new("biology".to_string()).unwrap(),
            subject: SubjectName::new("Cells".to_string()).unwrap(),
            status: SessionStatus::Waiting,
            flashcard_count: 3,
            created_at: Timestamp::new(1_700_000_000_123),
            participants: vec![ParticipantView {
                user_id: alice.user_id,
                username: alice.username.clone(),
                is_host: true,
                joined_at: Timestamp::new(1_700_000_000_123),
            }],
        };

        // when (操作):
        let value = serde_json::to_value(SessionEnvelopeDto::from(&view)).unwrap();

        // then (期待する結果):
        assert_eq!(value["session"]["join_code"], "ABC123");
        assert_eq!(value["session"]["created_at"], "2023-11-14T22:13:20.123Z");
        assert_eq!(value["session"]["status"], "waiting");
        assert_eq!(value["session"]["host"]["username"], "alice");
        assert_eq!(value["participants"][0]["is_host"], true);
    }

    #[test]
    fn test_requests_reject_unknown_fields() {
        let result = serde_json::from_str::<JoinLobbyRequest>(r#"{"join_code":"ABC123","x":1}"#);
        assert!(result.is_err());
    }
}
