//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum length of a display name.
pub const USERNAME_MAX_LENGTH: usize = 50;

/// Maximum length of a chat message.
pub const MESSAGE_CONTENT_MAX_LENGTH: usize = 2000;

/// Length of a join code.
pub const JOIN_CODE_LENGTH: usize = 6;

/// Alphabet join codes are drawn from.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            pub fn new(value: $inner) -> Self {
                Self(value)
            }

            pub fn value(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// Stable identifier of a user, owned by the identity collaborator.
    UserId(i64)
);
integer_id!(
    /// Identifier of a subject (a deck of flashcards).
    SubjectId(i64)
);
integer_id!(
    /// Identifier of a flashcard.
    FlashcardId(i64)
);
integer_id!(
    /// Identifier of one answer option of a flashcard.
    AnswerId(i64)
);
integer_id!(
    /// Identifier of a vote, stable across overwrites.
    VoteId(u64)
);
integer_id!(
    /// Identifier of a chat message within a session.
    ChatMessageId(u64)
);
integer_id!(
    /// Identifier of a session invitation.
    InvitationId(i64)
);

/// Display name of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Create a new Username.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or longer than [`USERNAME_MAX_LENGTH`].
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.trim().is_empty() {
            return Err(ValueObjectError::UsernameEmpty);
        }
        let len = name.chars().count();
        if len > USERNAME_MAX_LENGTH {
            return Err(ValueObjectError::UsernameTooLong {
                max: USERNAME_MAX_LENGTH,
                actual: len,
            });
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier value object.
///
/// Always a UUID in its hyphenated lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or not a valid UUID.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::SessionIdEmpty);
        }
        let uuid = uuid::Uuid::parse_str(&id)
            .map_err(|_| ValueObjectError::SessionIdInvalidFormat(id.clone()))?;
        Ok(Self::from_uuid(uuid))
    }

    /// Create a SessionId from a UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Six character code used to join a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Create a JoinCode from user input.
    ///
    /// Surrounding whitespace is ignored and lowercase letters are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error unless the code is exactly [`JOIN_CODE_LENGTH`] characters
    /// drawn from [`JOIN_CODE_ALPHABET`].
    pub fn new(code: String) -> Result<Self, ValueObjectError> {
        let normalized = code.trim().to_ascii_uppercase();
        let valid = normalized.len() == JOIN_CODE_LENGTH
            && normalized.bytes().all(|b| JOIN_CODE_ALPHABET.contains(&b));
        if !valid {
            return Err(ValueObjectError::JoinCodeInvalidFormat {
                length: JOIN_CODE_LENGTH,
                actual: code,
            });
        }
        Ok(Self(normalized))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a study group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ValueObjectError::GroupNameEmpty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a subject within a study group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectName(String);

impl SubjectName {
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ValueObjectError::SubjectNameEmpty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message content value object.
///
/// Represents the content of a chat message with validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    /// Create a new MessageContent.
    ///
    /// # Arguments
    ///
    /// * `content` - The message content string
    ///
    /// # Returns
    ///
    /// A Result containing the MessageContent or an error if validation fails
    pub fn new(content: String) -> Result<Self, ValueObjectError> {
        if content.trim().is_empty() {
            return Err(ValueObjectError::MessageContentEmpty);
        }
        let len = content.chars().count();
        if len > MESSAGE_CONTENT_MAX_LENGTH {
            return Err(ValueObjectError::MessageContentTooLong {
                max: MESSAGE_CONTENT_MAX_LENGTH,
                actual: len,
            });
        }
        Ok(Self(content))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp from Unix milliseconds.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(teamquiz_shared::time::now_millis())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// This timestamp shifted by `millis` (may be negative).
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).max(0)
    }

    /// RFC 3339 representation used at the HTTP boundary.
    pub fn to_rfc3339(&self) -> String {
        teamquiz_shared::time::millis_to_rfc3339(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_new_success() {
        // テスト項目: 有効なユーザー名を作成できる
        // given (前提条件):
        let name = "alice".to_string();

        // when (操作):
        let result = Username::new(name);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_username_new_empty_fails() {
        // テスト項目: 空白のみのユーザー名は作成できない
        let result = Username::new("   ".to_string());
        assert_eq!(result.unwrap_err(), ValueObjectError::UsernameEmpty);
    }

    #[test]
    fn test_username_new_too_long_fails() {
        // テスト項目: 51 文字以上のユーザー名は作成できない
        // given (前提条件):
        let name = "a".repeat(51);

        // when (操作):
        let result = Username::new(name);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::UsernameTooLong {
                max: 50,
                actual: 51
            }
        );
    }

    #[test]
    fn test_session_id_accepts_uuid() {
        // テスト項目: UUID 形式の文字列から SessionId を作成でき、小文字ハイフン形式に正規化される
        // given (前提条件):
        let id = "67E55044-10B1-426F-9247-BB680E5FE0C8".to_string();

        // when (操作):
        let result = SessionId::new(id);

        // then (期待する結果):
        assert_eq!(
            result.unwrap().as_str(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    #[test]
    fn test_session_id_rejects_non_uuid() {
        // テスト項目: UUID でない文字列は SessionId にできない
        let result = SessionId::new("default".to_string());
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::SessionIdInvalidFormat("default".to_string())
        );
        assert_eq!(
            SessionId::new(String::new()).unwrap_err(),
            ValueObjectError::SessionIdEmpty
        );
    }

    #[test]
    fn test_join_code_normalizes_case() {
        // テスト項目: 小文字と前後の空白を含む参加コードが正規化される
        // given (前提条件):
        let code = " ab12cd ".to_string();

        // when (操作):
        let result = JoinCode::new(code);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "AB12CD");
    }

    #[test]
    fn test_join_code_rejects_bad_input() {
        // テスト項目: 長さ違いや記号を含む参加コードは拒否される
        assert!(JoinCode::new("ABC12".to_string()).is_err());
        assert!(JoinCode::new("ABC1234".to_string()).is_err());
        assert!(JoinCode::new("ABC-12".to_string()).is_err());
    }

    #[test]
    fn test_message_content_new_too_long_fails() {
        // テスト項目: 2001 文字以上のメッセージ内容は作成できない
        // given (前提条件):
        let content = "a".repeat(2001);

        // when (操作):
        let result = MessageContent::new(content);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::MessageContentTooLong {
                max: 2000,
                actual: 2001
            }
        );
    }

    #[test]
    fn test_message_content_new_empty_fails() {
        // テスト項目: 空のメッセージ内容は作成できない
        let result = MessageContent::new("".to_string());
        assert_eq!(result.unwrap_err(), ValueObjectError::MessageContentEmpty);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        // テスト項目: タイムスタンプの加算と経過時間の計算
        // given (前提条件):
        let ts1 = Timestamp::new(1_000);

        // when (操作):
        let ts2 = ts1.plus_millis(500);

        // then (期待する結果):
        assert!(ts1 < ts2);
        assert_eq!(ts2.millis_since(ts1), 500);
        assert_eq!(ts1.millis_since(ts2), 0);
    }

    #[test]
    fn test_integer_ids_serialize_transparently() {
        // テスト項目: 整数 ID は JSON で数値としてシリアライズされる
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
