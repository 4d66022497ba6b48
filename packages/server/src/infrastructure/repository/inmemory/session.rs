//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! セッション本体は `Arc<Mutex<Session>>` として保持し、マップのロックとは
//! 独立したセッション単位のロックで更新します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{JoinCode, RepositoryError, Session, SessionHandle, SessionId, SessionRepository};

#[derive(Default)]
struct Store {
    sessions: HashMap<SessionId, SessionHandle>,
    /// 予約済みの参加コード
    codes: HashMap<JoinCode, SessionId>,
}

/// インメモリ Session Repository 実装
#[derive(Default)]
pub struct InMemorySessionRepository {
    store: RwLock<Store>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: Session) -> Result<SessionHandle, RepositoryError> {
        let mut store = self.store.write().await;
        if store.codes.contains_key(&session.join_code) {
            return Err(RepositoryError::JoinCodeTaken(session.join_code.clone()));
        }
        if store.sessions.contains_key(&session.id) {
            return Err(RepositoryError::DuplicateSession(session.id.clone()));
        }
        let id = session.id.clone();
        store.codes.insert(session.join_code.clone(), id.clone());
        let handle = Arc::new(Mutex::new(session));
        store.sessions.insert(id, handle.clone());
        Ok(handle)
    }

    async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.store.read().await.sessions.get(id).cloned()
    }

    async fn find_by_code(&self, code: &JoinCode) -> Option<SessionHandle> {
        let store = self.store.read().await;
        let id = store.codes.get(code)?;
        store.sessions.get(id).cloned()
    }

    async fn list(&self) -> Vec<SessionHandle> {
        self.store.read().await.sessions.values().cloned().collect()
    }

    async fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        let mut store = self.store.write().await;
        store.codes.retain(|_, session_id| session_id != id);
        store.sessions.remove(id)
    }

    async fn release_code(&self, code: &JoinCode) {
        self.store.write().await.codes.remove(code);
    }

    async fn count(&self) -> usize {
        self.store.read().await.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GroupName, SessionIdFactory, Subject, SubjectId, SubjectName, Timestamp, User, UserId,
        Username,
    };

    fn session(code: &str) -> Session {
        Session::new(
            SessionIdFactory::generate(),
            JoinCode::new(code.to_string()).unwrap(),
            User::new(UserId::new(1), Username::new("alice".to_string()).unwrap()),
            Subject {
                id: SubjectId::new(1),
                name: SubjectName::new("Cells".to_string()).unwrap(),
                group: GroupName::new("biology".to_string()).unwrap(),
            },
            3,
            Timestamp::new(0),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_by_code() {
        // テスト項目: 追加したセッションを ID と参加コードの両方で取得できる
        // given (前提条件):
        let repo = InMemorySessionRepository::new();
        let session = session("ABC123");
        let id = session.id.clone();

        // when (操作):
        repo.insert(session).await.unwrap();

        // then (期待する結果):
        assert!(repo.get(&id).await.is_some());
        let found = repo
            .find_by_code(&JoinCode::new("abc123".to_string()).unwrap())
            .await
            .unwrap();
        assert_eq!(found.lock().await.id, id);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_reserved_code() {
        // テスト項目: 予約済みの参加コードを持つセッションは追加できない
        let repo = InMemorySessionRepository::new();
        repo.insert(session("ABC123")).await.unwrap();

        let result = repo.insert(session("ABC123")).await;

        assert!(matches!(result, Err(RepositoryError::JoinCodeTaken(_))));
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_release_and_remove_free_the_code() {
        // テスト項目: コードの解放・セッションの削除後は同じコードを再利用できる
        let repo = InMemorySessionRepository::new();
        let first = session("ABC123");
        let first_id = first.id.clone();
        repo.insert(first).await.unwrap();

        repo.release_code(&JoinCode::new("ABC123".to_string()).unwrap()).await;
        assert!(repo.find_by_code(&JoinCode::new("ABC123".to_string()).unwrap()).await.is_none());
        assert!(repo.get(&first_id).await.is_some());

        let second = session("ABC123");
        let second_id = second.id.clone();
        repo.insert(second).await.unwrap();
        repo.remove(&second_id).await.unwrap();
        repo.insert(session("ABC123")).await.unwrap();
        assert_eq!(repo.count().await, 2);
    }
}
