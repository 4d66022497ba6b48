//! UseCase: セッション内チャット
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ChatUseCase::send() と ChatUseCase::history()
//!
//! ### なぜこのテストが必要か
//! - チャットは参加者のみが送受信できる
//! - 履歴は設定された件数に制限され、時系列順で返される
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信と chat_message の通知
//! - 異常系：参加者以外の送信、空メッセージ
//! - エッジケース：上限を超える履歴

use tracing::debug;

use crate::domain::{ChatMessage, Event, MessageContent, SessionId, Timestamp, User};

use super::{context::UseCaseContext, error::UseCaseError};

/// チャットのユースケース
pub struct ChatUseCase {
    ctx: UseCaseContext,
}

impl ChatUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// メッセージを送信し、部屋に chat_message を通知する
    pub async fn send(
        &self,
        user: &User,
        session_id: &SessionId,
        message: String,
    ) -> Result<ChatMessage, UseCaseError> {
        let content = MessageContent::new(message)?;
        let mut session = self.ctx.lock_session(session_id).await?;
        let message = session.post_message(user, content, Timestamp::now())?;

        debug!(session_id = %session.id, user_id = %user.id, message_id = %message.id, "chat message");
        self.ctx.publish_room(
            &session,
            Event::ChatMessage {
                session_id: session.id.clone(),
                id: message.id,
                user_id: message.from.id,
                username: message.from.username.clone(),
                message: message.content.as_str().to_string(),
                sent_at: message.sent_at,
            },
        );
        Ok(message)
    }

    /// 直近のメッセージを時系列順で返す
    pub async fn history(
        &self,
        user: &User,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, UseCaseError> {
        let session = self.ctx.lock_session(session_id).await?;
        session.ensure_participant(user.id)?;
        Ok(session.recent_messages(self.ctx.chat_history_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::{LobbyUseCase, test_support::Fixture};

    #[tokio::test]
    async fn test_send_and_history() {
        // テスト項目: 送信したメッセージが通知され、履歴に時系列順で残る
        // given (前提条件):
        let fixture = Fixture::new(1);
        let lobby = LobbyUseCase::new(fixture.ctx());
        let chat = ChatUseCase::new(fixture.ctx());
        let view = lobby
            .create(&fixture.alice, Fixture::subject_name(), Fixture::group_name())
            .await
            .unwrap();
        lobby.join_by_code(&fixture.bob, view.join_code.clone()).await.unwrap();
        fixture.publisher.clear();

        // when (操作):
        chat.send(&fixture.alice, &view.id, "hello".to_string()).await.unwrap();
        chat.send(&fixture.bob, &view.id, "hi".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(fixture.publisher.kinds(), vec!["chat_message", "chat_message"]);
        let history = chat.history(&fixture.bob, &view.id).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi"]);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        // テスト項目: 履歴は chat_history_limit 件に制限される
        let fixture = Fixture::new(1);
        let lobby = LobbyUseCase::new(fixture.ctx());
        let mut ctx = fixture.ctx();
        ctx.chat_history_limit = 2;
        let chat = ChatUseCase::new(ctx);
        let view = lobby
            .create(&fixture.alice, Fixture::subject_name(), Fixture::group_name())
            .await
            .unwrap();
        for i in 0..4 {
            chat.send(&fixture.alice, &view.id, format!("m{i}")).await.unwrap();
        }

        let history = chat.history(&fixture.alice, &view.id).await.unwrap();

        let texts: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["m2", "m3"]);
    }

    #[tokio::test]
    async fn test_non_participant_cannot_chat() {
        let fixture = Fixture::new(1);
        let lobby = LobbyUseCase::new(fixture.ctx());
        let chat = ChatUseCase::new(fixture.ctx());
        let view = lobby
            .create(&fixture.alice, Fixture::subject_name(), Fixture::group_name())
            .await
            .unwrap();

        assert!(matches!(
            chat.send(&fixture.bob, &view.id, "hey".to_string()).await,
            Err(UseCaseError::Forbidden(_))
        ));
        assert!(matches!(
            chat.history(&fixture.bob, &view.id).await,
            Err(UseCaseError::Forbidden(_))
        ));
        assert!(matches!(
            chat.send(&fixture.alice, &view.id, "   ".to_string()).await,
            Err(UseCaseError::BadRequest(_))
        ));
    }
}
