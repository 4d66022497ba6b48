//! InMemory Invitation Repository 実装

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Invitation, InvitationError, InvitationId, InvitationRepository, InvitationStatus,
    InvitationUpdate, SessionId, Timestamp, User, UserId,
};

struct Store {
    next_id: i64,
    invitations: BTreeMap<InvitationId, Invitation>,
}

/// インメモリ Invitation Repository 実装
///
/// ID は 1 からの連番で、BTreeMap により作成順に並ぶ。
pub struct InMemoryInvitationRepository {
    store: Mutex<Store>,
}

impl InMemoryInvitationRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                next_id: 1,
                invitations: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    async fn create_or_get_pending(
        &self,
        session_id: &SessionId,
        inviter: User,
        invitee: User,
        now: Timestamp,
    ) -> (Invitation, bool) {
        let mut store = self.store.lock().await;
        let existing = store.invitations.values().find(|i| {
            i.session_id == *session_id
                && i.invitee.id == invitee.id
                && i.status == InvitationStatus::Pending
        });
        if let Some(existing) = existing {
            return (existing.clone(), false);
        }

        let id = InvitationId::new(store.next_id);
        store.next_id += 1;
        let invitation = Invitation {
            id,
            session_id: session_id.clone(),
            inviter,
            invitee,
            status: InvitationStatus::Pending,
            created_at: now,
        };
        store.invitations.insert(id, invitation.clone());
        (invitation, true)
    }

    async fn get(&self, id: InvitationId) -> Option<Invitation> {
        self.store.lock().await.invitations.get(&id).cloned()
    }

    async fn update(
        &self,
        id: InvitationId,
        apply: InvitationUpdate,
    ) -> Option<Result<Invitation, InvitationError>> {
        let mut store = self.store.lock().await;
        let stored = store.invitations.get_mut(&id)?;
        let mut updated = stored.clone();
        Some(apply(&mut updated).map(|()| {
            *stored = updated.clone();
            updated
        }))
    }

    async fn pending_for(&self, invitee: UserId) -> Vec<Invitation> {
        self.store
            .lock()
            .await
            .invitations
            .values()
            .filter(|i| i.invitee.id == invitee && i.status == InvitationStatus::Pending)
            .cloned()
            .collect()
    }

    async fn remove_for_session(&self, session_id: &SessionId) {
        self.store
            .lock()
            .await
            .invitations
            .retain(|_, i| i.session_id != *session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionIdFactory, Username};

    fn user(id: i64, name: &str) -> User {
        User::new(UserId::new(id), Username::new(name.to_string()).unwrap())
    }

    #[tokio::test]
    async fn test_create_or_get_pending_deduplicates() {
        // テスト項目: 同じセッション・同じ相手への保留中の招待は 1 件にまとめられる
        // given (前提条件):
        let repo = InMemoryInvitationRepository::new();
        let session_id = SessionIdFactory::generate();

        // when (操作):
        let (first, created_first) = repo
            .create_or_get_pending(&session_id, user(1, "alice"), user(2, "bob"), Timestamp::new(0))
            .await;
        let (second, created_second) = repo
            .create_or_get_pending(&session_id, user(3, "carol"), user(2, "bob"), Timestamp::new(1))
            .await;

        // then (期待する結果):
        assert!(created_first);
        assert!(!created_second);
        assert_eq!(first.id, second.id);
        assert_eq!(repo.pending_for(UserId::new(2)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_untouched() {
        // テスト項目: 更新処理が失敗した場合、保存済みの招待は変更されない
        let repo = InMemoryInvitationRepository::new();
        let session_id = SessionIdFactory::generate();
        let (invitation, _) = repo
            .create_or_get_pending(&session_id, user(1, "alice"), user(2, "bob"), Timestamp::new(0))
            .await;

        let result = repo
            .update(
                invitation.id,
                Box::new(|i: &mut Invitation| i.accept(UserId::new(3))),
            )
            .await
            .unwrap();

        assert_eq!(result, Err(InvitationError::NotInvitee(UserId::new(3))));
        assert_eq!(
            repo.get(invitation.id).await.unwrap().status,
            InvitationStatus::Pending
        );
        assert!(repo.update(InvitationId::new(42), Box::new(|_: &mut Invitation| Ok(()))).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_for_session() {
        let repo = InMemoryInvitationRepository::new();
        let session_id = SessionIdFactory::generate();
        repo.create_or_get_pending(&session_id, user(1, "alice"), user(2, "bob"), Timestamp::new(0))
            .await;

        repo.remove_for_session(&session_id).await;

        assert!(repo.pending_for(UserId::new(2)).await.is_empty());
    }
}
