//! UseCase 間で共有する依存関係とヘルパー
//!
//! セッションのロック取得、読み取り権限の判定、イベント発行をまとめます。
//! ロック順序: セッションマップのロックをセッションロック保持中に取得しないこと。

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::domain::{
    Audience, Catalog, CloseReason, Event, EventPublisher, GroupName, InvitationRepository,
    ParticipantView, Session, SessionHandle, SessionId, SessionRepository, SessionStatus,
    SubjectId, Timestamp, User, UserId,
};

use super::error::UseCaseError;

/// コーディネーターの依存関係一式
#[derive(Clone)]
pub struct UseCaseContext {
    pub sessions: Arc<dyn SessionRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub publisher: Arc<dyn EventPublisher>,
    /// チャット履歴の取得件数の上限
    pub chat_history_limit: usize,
}

/// セッションの不変な属性（ロック外で参照するためのコピー）
#[derive(Debug, Clone)]
pub(crate) struct SessionKey {
    pub handle: SessionHandle,
    pub group: GroupName,
    pub subject_id: SubjectId,
}

impl UseCaseContext {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        invitations: Arc<dyn InvitationRepository>,
        catalog: Arc<dyn Catalog>,
        publisher: Arc<dyn EventPublisher>,
        chat_history_limit: usize,
    ) -> Self {
        Self {
            sessions,
            invitations,
            catalog,
            publisher,
            chat_history_limit,
        }
    }

    /// セッションの排他区間に入る
    ///
    /// ストアから削除済みのセッションは NotFound として扱う。
    pub(crate) async fn lock_session(
        &self,
        id: &SessionId,
    ) -> Result<OwnedMutexGuard<Session>, UseCaseError> {
        let handle = self
            .sessions
            .get(id)
            .await
            .ok_or_else(UseCaseError::session_not_found)?;
        Self::lock_handle(handle).await
    }

    pub(crate) async fn lock_handle(
        handle: SessionHandle,
    ) -> Result<OwnedMutexGuard<Session>, UseCaseError> {
        let guard = handle.lock_owned().await;
        if guard.is_closed() {
            return Err(UseCaseError::session_not_found());
        }
        Ok(guard)
    }

    /// グループと科目を読み出す。どちらもセッションの生存中は変わらない。
    pub(crate) async fn session_key(&self, id: &SessionId) -> Result<SessionKey, UseCaseError> {
        let handle = self
            .sessions
            .get(id)
            .await
            .ok_or_else(UseCaseError::session_not_found)?;
        let (group, subject_id) = {
            let session = Self::lock_handle(handle.clone()).await?;
            (session.group().clone(), session.subject.id)
        };
        Ok(SessionKey {
            handle,
            group,
            subject_id,
        })
    }

    pub(crate) async fn is_member(
        &self,
        group: &GroupName,
        user: UserId,
    ) -> Result<bool, UseCaseError> {
        Ok(self.catalog.is_group_member(group, user).await?)
    }

    /// 参加者、または待機中セッションのグループメンバーであれば読み取り可能
    pub(crate) fn ensure_can_read(
        session: &Session,
        user: UserId,
        is_group_member: bool,
    ) -> Result<(), UseCaseError> {
        if session.is_participant(user) {
            return Ok(());
        }
        if is_group_member && session.status == SessionStatus::Waiting {
            return Ok(());
        }
        Err(UseCaseError::Forbidden(format!(
            "User {user} cannot access this session"
        )))
    }

    pub(crate) fn publish_room(&self, session: &Session, event: Event) {
        debug!(session_id = %session.id, event = event.kind(), "publish to room");
        self.publisher
            .publish(Audience::Room(session.id.clone()), event);
    }

    /// 現在の参加者一覧とステータスを部屋に通知する
    pub(crate) fn publish_lobby_update(&self, session: &Session) {
        self.publish_room(
            session,
            Event::LobbyUpdate {
                session_id: session.id.clone(),
                status: session.status,
                participants: session.participant_views(),
            },
        );
    }

    /// 参加者を追加し、追加された場合のみ部屋に通知する
    pub(crate) fn admit(&self, session: &mut Session, user: &User) {
        let Some(participant) = session
            .add_participant(user.clone(), Timestamp::now())
            .map(ParticipantView::from)
        else {
            return;
        };
        info!(session_id = %session.id, user_id = %user.id, "participant joined");
        self.publish_room(
            session,
            Event::ParticipantJoined {
                session_id: session.id.clone(),
                participant,
            },
        );
        self.publish_lobby_update(session);
    }

    /// セッションを閉じて部屋に通知する
    ///
    /// ロック保持中に呼ぶこと。ストアからの削除は [`Self::drop_session`] で
    /// ロック解放後に行う。
    pub(crate) fn close_session(&self, session: &mut Session, reason: CloseReason) {
        session.close();
        self.publish_room(
            session,
            Event::SessionClosed {
                session_id: session.id.clone(),
                reason,
            },
        );
    }

    /// 閉じたセッションをストアから削除する。セッションロックを保持していないこと。
    pub(crate) async fn drop_session(&self, id: &SessionId) {
        self.sessions.remove(id).await;
        self.invitations.remove_for_session(id).await;
    }
}
