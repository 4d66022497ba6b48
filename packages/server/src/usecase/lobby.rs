//! UseCase: ロビー（セッションの作成・参加・退出）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LobbyUseCase の create / join_by_code / join_existing_by_subject /
//!   auto_attach_on_url_visit / leave / details
//!
//! ### なぜこのテストが必要か
//! - ホストの一意性と参加者の重複防止はセッションの基本的な不変条件
//! - ホスト退出時の解体・ホスト移譲はイベントの順序を含めて保証する必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成、コード参加、科目指定参加、URL 訪問による自動参加
//! - 異常系：未知の科目、グループ非メンバー、存在しない参加コード
//! - エッジケース：同じユーザーの重複参加、待機中のホスト退出、ゲーム中のホスト退出

use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use crate::domain::{
    CloseReason, Event, GroupName, JoinCode, JoinCodeFactory, LeaveOutcome, ParticipantView,
    RepositoryError, Session, SessionId, SessionIdFactory, SessionStatus, SessionView,
    SubjectName, Timestamp, User, UserRef,
};

use super::{context::UseCaseContext, error::UseCaseError};

/// 参加コードの衝突時に再抽選する回数
const JOIN_CODE_ATTEMPTS: usize = 16;

/// ロビー操作のユースケース
pub struct LobbyUseCase {
    ctx: UseCaseContext,
}

impl LobbyUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// 新しいセッションを作成する
    ///
    /// # Returns
    ///
    /// * `Ok(SessionView)` - 作成されたセッション（ホストのみが参加者）
    /// * `Err(UseCaseError::NotFound)` - グループまたは科目が存在しない
    /// * `Err(UseCaseError::Forbidden)` - ホストがグループのメンバーでない
    pub async fn create(
        &self,
        host: &User,
        subject_name: SubjectName,
        group_name: GroupName,
    ) -> Result<SessionView, UseCaseError> {
        let group = self
            .ctx
            .catalog
            .find_group(&group_name)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Group {group_name} not found")))?;
        let subject = self
            .ctx
            .catalog
            .find_subject(&group.name, &subject_name)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Subject {subject_name} not found")))?;
        if !group.is_member(host.id) {
            return Err(UseCaseError::Forbidden(format!(
                "User {} is not a member of group {}",
                host.id, group.name
            )));
        }
        let flashcard_count = self.ctx.catalog.deck(subject.id).await?.len();

        let mut rng = StdRng::from_entropy();
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let session = Session::new(
                SessionIdFactory::generate(),
                JoinCodeFactory::generate(&mut rng),
                host.clone(),
                subject.clone(),
                flashcard_count,
                Timestamp::now(),
            );
            match self.ctx.sessions.insert(session).await {
                Ok(handle) => {
                    let session = handle.lock().await;
                    info!(
                        session_id = %session.id,
                        user_id = %host.id,
                        join_code = %session.join_code,
                        "session created"
                    );
                    return Ok(session.view());
                }
                Err(RepositoryError::JoinCodeTaken(code)) => {
                    warn!(join_code = %code, "join code collision, drawing again");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(UseCaseError::Internal(
            "Could not allocate a unique join code".to_string(),
        ))
    }

    /// 参加コードでセッションに参加する
    ///
    /// すでに参加者であれば何もせず現在の状態を返す。
    pub async fn join_by_code(&self, user: &User, code: JoinCode) -> Result<SessionView, UseCaseError> {
        let handle = self
            .ctx
            .sessions
            .find_by_code(&code)
            .await
            .ok_or_else(|| UseCaseError::NotFound(format!("No active session for code {code}")))?;
        let mut session = UseCaseContext::lock_handle(handle).await?;
        if !session.is_active() {
            return Err(UseCaseError::NotFound(format!(
                "No active session for code {code}"
            )));
        }
        self.ctx.admit(&mut session, user);
        Ok(session.view())
    }

    /// 科目に紐づく待機中のセッションに参加する
    ///
    /// 待機中のセッションが複数ある場合は最も古いものを選ぶ。
    pub async fn join_existing_by_subject(
        &self,
        user: &User,
        subject_name: SubjectName,
        group_name: GroupName,
    ) -> Result<SessionView, UseCaseError> {
        let subject = self
            .ctx
            .catalog
            .find_subject(&group_name, &subject_name)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Subject {subject_name} not found")))?;
        if !self.ctx.is_member(&group_name, user.id).await? {
            return Err(UseCaseError::Forbidden(format!(
                "User {} is not a member of group {group_name}",
                user.id
            )));
        }

        let mut oldest: Option<(Timestamp, SessionId)> = None;
        for handle in self.ctx.sessions.list().await {
            let session = handle.lock().await;
            if session.is_closed()
                || session.status != SessionStatus::Waiting
                || session.subject.id != subject.id
            {
                continue;
            }
            if oldest
                .as_ref()
                .is_none_or(|(created_at, _)| session.created_at < *created_at)
            {
                oldest = Some((session.created_at, session.id.clone()));
            }
        }
        let (_, session_id) = oldest.ok_or_else(|| {
            UseCaseError::NotFound(format!("No waiting session for subject {subject_name}"))
        })?;

        let mut session = self.ctx.lock_session(&session_id).await?;
        if session.status != SessionStatus::Waiting {
            return Err(UseCaseError::NotFound(format!(
                "No waiting session for subject {subject_name}"
            )));
        }
        self.ctx.admit(&mut session, user);
        Ok(session.view())
    }

    /// セッションの URL を訪れたユーザーを必要に応じて自動参加させ、詳細を返す
    ///
    /// 待機中のセッションでは、グループメンバーかつ未参加のユーザーを追加する。
    /// それ以外のステータスでは参加者を変更しない。
    pub async fn auto_attach_on_url_visit(
        &self,
        user: &User,
        session_id: &SessionId,
    ) -> Result<SessionView, UseCaseError> {
        let key = self.ctx.session_key(session_id).await?;
        let is_member = self.ctx.is_member(&key.group, user.id).await?;

        let mut session = UseCaseContext::lock_handle(key.handle).await?;
        UseCaseContext::ensure_can_read(&session, user.id, is_member)?;
        if session.status == SessionStatus::Waiting && is_member {
            self.ctx.admit(&mut session, user);
        }
        Ok(session.view())
    }

    /// セッションの詳細（参加者を変更しない）
    pub async fn details(&self, user: &User, session_id: &SessionId) -> Result<SessionView, UseCaseError> {
        let key = self.ctx.session_key(session_id).await?;
        let is_member = self.ctx.is_member(&key.group, user.id).await?;

        let session = UseCaseContext::lock_handle(key.handle).await?;
        UseCaseContext::ensure_can_read(&session, user.id, is_member)?;
        Ok(session.view())
    }

    pub async fn participants(
        &self,
        user: &User,
        session_id: &SessionId,
    ) -> Result<Vec<ParticipantView>, UseCaseError> {
        Ok(self.details(user, session_id).await?.participants)
    }

    /// プッシュ経路でセッションの部屋に入れるかを判定する
    ///
    /// 読み取り権限と同じ規則を使う。
    pub async fn authorize_room(&self, user: &User, session_id: &SessionId) -> Result<(), UseCaseError> {
        self.details(user, session_id).await.map(|_| ())
    }

    /// セッションから退出する
    ///
    /// 参加者でないユーザーの退出は何もしない。
    pub async fn leave(&self, user: &User, session_id: &SessionId) -> Result<LeaveOutcome, UseCaseError> {
        let mut session = self.ctx.lock_session(session_id).await?;
        let outcome = session.leave(user.id, Timestamp::now());
        let mut drop_session = false;
        let mut release_code = None;

        match &outcome {
            LeaveOutcome::NotParticipant => {}
            LeaveOutcome::Left(participant) => {
                info!(session_id = %session.id, user_id = %user.id, "participant left");
                self.ctx.publish_room(
                    &session,
                    Event::ParticipantLeft {
                        session_id: session.id.clone(),
                        user_id: participant.user.id,
                        username: participant.user.username.clone(),
                    },
                );
                self.ctx.publish_lobby_update(&session);
            }
            LeaveOutcome::TornDown { participants } => {
                info!(
                    session_id = %session.id,
                    user_id = %user.id,
                    participants = participants.len(),
                    "host left, tearing session down"
                );
                self.ctx.close_session(&mut session, CloseReason::HostLeft);
                drop_session = true;
            }
            LeaveOutcome::HostTransferred { previous, new_host } => {
                info!(
                    session_id = %session.id,
                    previous_host_id = %previous.user.id,
                    new_host_id = %new_host.user.id,
                    "host transferred"
                );
                self.ctx.publish_room(
                    &session,
                    Event::ParticipantLeft {
                        session_id: session.id.clone(),
                        user_id: previous.user.id,
                        username: previous.user.username.clone(),
                    },
                );
                self.ctx.publish_room(
                    &session,
                    Event::HostChanged {
                        session_id: session.id.clone(),
                        previous_host_id: previous.user.id,
                        new_host: UserRef::from(&new_host.user),
                    },
                );
                self.ctx.publish_lobby_update(&session);
            }
            LeaveOutcome::Finalized(result) => {
                info!(
                    session_id = %session.id,
                    total_score = result.total_score,
                    "last participant left, game finalized"
                );
                self.ctx.publish_room(
                    &session,
                    Event::GameFinished {
                        session_id: session.id.clone(),
                        result: result.clone(),
                    },
                );
                self.ctx.publish_lobby_update(&session);
                release_code = Some(session.join_code.clone());
            }
        }
        let id = session.id.clone();
        drop(session);

        if drop_session {
            self.ctx.drop_session(&id).await;
        }
        if let Some(code) = release_code {
            self.ctx.sessions.release_code(&code).await;
        }
        Ok(outcome)
    }
}
