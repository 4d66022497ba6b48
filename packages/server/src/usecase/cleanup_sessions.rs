//! UseCase: 放置された待機中セッションの削除
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CleanupSessionsUseCase::execute_at()
//!
//! ### なぜこのテストが必要か
//! - 開始されないまま放置されたセッションは参加コードを占有し続ける
//! - ゲーム中・終了済みのセッションは削除してはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：31 分経過した待機中セッションの削除
//! - エッジケース：ホストのみで 5 分経過した待機中セッション、同じ経過時間のゲーム中セッション

use std::time::Duration;

use tracing::info;

use crate::domain::{CloseReason, SessionId, SessionStatus, Timestamp};

use super::context::UseCaseContext;

/// 削除の基準となる経過時間
#[derive(Debug, Clone, Copy)]
pub struct CleanupPolicy {
    /// 待機中セッションの最長寿命
    pub waiting_ttl: Duration,
    /// ホスト以外の参加者がいない待機中セッションの最長寿命
    pub empty_lobby_ttl: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            waiting_ttl: Duration::from_secs(30 * 60),
            empty_lobby_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// 待機中セッションの掃除のユースケース
pub struct CleanupSessionsUseCase {
    ctx: UseCaseContext,
    policy: CleanupPolicy,
}

impl CleanupSessionsUseCase {
    pub fn new(ctx: UseCaseContext, policy: CleanupPolicy) -> Self {
        Self { ctx, policy }
    }

    pub async fn execute(&self) -> Vec<SessionId> {
        self.execute_at(Timestamp::now()).await
    }

    /// `now` を基準に期限切れの待機中セッションを削除し、削除した ID を返す
    pub async fn execute_at(&self, now: Timestamp) -> Vec<SessionId> {
        let waiting_ttl = self.policy.waiting_ttl.as_millis() as i64;
        let empty_ttl = self.policy.empty_lobby_ttl.as_millis() as i64;
        let mut expired = Vec::new();

        for handle in self.ctx.sessions.list().await {
            let mut session = handle.lock().await;
            if session.is_closed() || session.status != SessionStatus::Waiting {
                continue;
            }
            let age = now.millis_since(session.created_at);
            let stale = age > waiting_ttl;
            let empty = session.guest_count() == 0 && age > empty_ttl;
            if !stale && !empty {
                continue;
            }
            info!(
                session_id = %session.id,
                age_secs = age / 1000,
                participants = session.participants.len(),
                "expiring waiting session"
            );
            self.ctx.close_session(&mut session, CloseReason::Expired);
            session.participants.clear();
            expired.push(session.id.clone());
        }

        for id in &expired {
            self.ctx.drop_session(id).await;
        }
        if !expired.is_empty() {
            let remaining = self.ctx.sessions.count().await;
            info!(expired = expired.len(), remaining, "session sweep finished");
        }
        expired
    }
}
