//! UseCase: セッションへの招待
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - InvitationUseCase の send / accept / reject / pending
//!
//! ### なぜこのテストが必要か
//! - 承諾は冪等で、招待された本人だけが承諾・拒否できる
//! - 承諾と拒否は互いに取り消せない
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信、new_invitation の通知、承諾による参加
//! - 異常系：参加者以外からの送信、グループ外への送信、本人以外の承諾
//! - エッジケース：重複送信、二重承諾、拒否後の承諾、終了済みセッションへの承諾

use tracing::info;

use crate::domain::{
    Audience, Event, Invitation, InvitationId, SessionId, SessionView, Timestamp, User, UserRef,
    Username,
};

use super::{context::UseCaseContext, error::UseCaseError};

/// 招待のユースケース
pub struct InvitationUseCase {
    ctx: UseCaseContext,
}

impl InvitationUseCase {
    pub fn new(ctx: UseCaseContext) -> Self {
        Self { ctx }
    }

    /// 招待を送信する
    ///
    /// 同じ相手への保留中の招待があればそれを返し、通知は行わない。
    pub async fn send(
        &self,
        inviter: &User,
        session_id: &SessionId,
        invitee_name: Username,
    ) -> Result<Invitation, UseCaseError> {
        let invitee = self
            .ctx
            .catalog
            .find_user_by_name(&invitee_name)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("User {invitee_name} not found")))?;
        let key = self.ctx.session_key(session_id).await?;
        let invitee_is_member = self.ctx.is_member(&key.group, invitee.id).await?;

        let session = UseCaseContext::lock_handle(key.handle).await?;
        session.ensure_participant(inviter.id)?;
        if !session.is_active() {
            return Err(UseCaseError::Conflict("Session is finished".to_string()));
        }
        if !invitee_is_member {
            return Err(UseCaseError::Forbidden(format!(
                "User {} is not a member of group {}",
                invitee.id,
                session.group()
            )));
        }
        if session.is_participant(invitee.id) {
            return Err(UseCaseError::Conflict(format!(
                "User {} is already a participant",
                invitee.id
            )));
        }

        let (invitation, created) = self
            .ctx
            .invitations
            .create_or_get_pending(&session.id, inviter.clone(), invitee.clone(), Timestamp::now())
            .await;
        if created {
            info!(
                session_id = %session.id,
                invitation_id = %invitation.id,
                invitee_id = %invitee.id,
                "invitation sent"
            );
            self.ctx.publisher.publish(
                Audience::User(invitee.id),
                Event::NewInvitation {
                    invitation_id: invitation.id,
                    session_id: session.id.clone(),
                    inviter: UserRef::from(inviter),
                    group: session.group().clone(),
                    subject: session.subject.name.clone(),
                },
            );
        }
        Ok(invitation)
    }

    /// 招待を承諾し、セッションに参加する（冪等）
    pub async fn accept(
        &self,
        user: &User,
        id: InvitationId,
    ) -> Result<(Invitation, SessionView), UseCaseError> {
        let invitation = self.find(id).await?;
        if invitation.invitee.id != user.id {
            return Err(UseCaseError::Forbidden(format!(
                "User {} is not the invitee",
                user.id
            )));
        }

        let mut session = self.ctx.lock_session(&invitation.session_id).await?;
        if !session.is_active() {
            return Err(UseCaseError::Conflict("Session is finished".to_string()));
        }
        let user_id = user.id;
        let invitation = self
            .ctx
            .invitations
            .update(id, Box::new(move |invitation: &mut Invitation| invitation.accept(user_id)))
            .await
            .ok_or_else(|| Self::not_found(id))??;

        self.ctx.admit(&mut session, user);
        Ok((invitation, session.view()))
    }

    /// 招待を拒否する（冪等）
    pub async fn reject(&self, user: &User, id: InvitationId) -> Result<Invitation, UseCaseError> {
        let user_id = user.id;
        let invitation = self
            .ctx
            .invitations
            .update(id, Box::new(move |invitation: &mut Invitation| invitation.reject(user_id)))
            .await
            .ok_or_else(|| Self::not_found(id))??;
        Ok(invitation)
    }

    /// 自分宛ての保留中の招待
    pub async fn pending(&self, user: &User) -> Vec<Invitation> {
        self.ctx.invitations.pending_for(user.id).await
    }

    async fn find(&self, id: InvitationId) -> Result<Invitation, UseCaseError> {
        self.ctx
            .invitations
            .get(id)
            .await
            .ok_or_else(|| Self::not_found(id))
    }

    fn not_found(id: InvitationId) -> UseCaseError {
        UseCaseError::NotFound(format!("Invitation {id} not found"))
    }
}
