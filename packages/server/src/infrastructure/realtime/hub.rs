//! Fan-out hub.
//!
//! Serializes an event once and pushes the frame to every channel of its
//! audience without waiting. A channel whose buffer is full or whose socket
//! task has gone away is detached instead of stalling the broadcast.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use super::presence::PresenceRegistry;
use crate::domain::{Audience, Event, GroupName, SessionId, UserId};

pub struct FanoutHub {
    presence: Arc<PresenceRegistry>,
}

impl FanoutHub {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self { presence }
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    pub async fn send_to_user(&self, user: UserId, event: &Event) -> usize {
        self.deliver(&Audience::User(user), event).await
    }

    pub async fn broadcast_to_group(&self, group: &GroupName, event: &Event) -> usize {
        self.deliver(&Audience::Group(group.clone()), event).await
    }

    pub async fn broadcast_to_room(&self, session_id: &SessionId, event: &Event) -> usize {
        self.deliver(&Audience::Room(session_id.clone()), event).await
    }

    /// Returns the number of channels the frame was queued on.
    pub async fn deliver(&self, audience: &Audience, event: &Event) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                error!(event = event.kind(), "failed to serialize event: {}", e);
                return 0;
            }
        };

        let channels = self.presence.channels_for(audience).await;
        let mut delivered = 0;
        let mut dropped = Vec::new();
        for (connection_id, sender) in channels {
            match sender.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(connection_id = %connection_id, event = event.kind(), "outbound buffer full, dropping channel");
                    dropped.push(connection_id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection_id = %connection_id, "channel already closed");
                    dropped.push(connection_id);
                }
            }
        }

        for connection_id in dropped {
            self.presence.detach(connection_id).await;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CloseReason, MockEventPublisher, PresenceScope, SessionIdFactory, User, Username,
    };
    use tokio::sync::mpsc;

    fn user(id: i64, name: &str) -> User {
        User::new(UserId::new(id), Username::new(name.to_string()).unwrap())
    }

    fn hub() -> FanoutHub {
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().returning(|_, _| ());
        FanoutHub::new(Arc::new(PresenceRegistry::new(Arc::new(publisher))))
    }

    fn closed_event(session_id: &SessionId) -> Event {
        Event::SessionClosed {
            session_id: session_id.clone(),
            reason: CloseReason::Expired,
        }
    }

    #[tokio::test]
    async fn test_broadcast_to_room_reaches_only_room_members() {
        // テスト項目: 部屋へのブロードキャストは部屋にいるユーザーの全チャンネルにだけ届く
        // given (前提条件):
        let hub = hub();
        let room = SessionIdFactory::generate();
        let (alice_tx1, mut alice_rx1) = mpsc::channel(8);
        let (alice_tx2, mut alice_rx2) = mpsc::channel(8);
        let (bob_tx, mut bob_rx) = mpsc::channel(8);
        hub.presence().attach(user(1, "alice"), alice_tx1).await;
        hub.presence().attach(user(1, "alice"), alice_tx2).await;
        hub.presence().attach(user(2, "bob"), bob_tx).await;
        hub.presence().join_session_room(UserId::new(1), &room).await;

        // when (操作):
        let delivered = hub.broadcast_to_room(&room, &closed_event(&room)).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        let frame: serde_json::Value = serde_json::from_str(&alice_rx1.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "session_closed");
        assert!(alice_rx2.recv().await.is_some());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_channel_is_detached() {
        // テスト項目: バッファが満杯のチャンネルは切り離され、他の受信者には届き続ける
        // given (前提条件):
        let hub = hub();
        let room = SessionIdFactory::generate();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        let slow = hub.presence().attach(user(1, "alice"), slow_tx).await;
        hub.presence().attach(user(2, "bob"), fast_tx).await;
        hub.presence().join_session_room(UserId::new(1), &room).await;
        hub.presence().join_session_room(UserId::new(2), &room).await;

        // when (操作):
        hub.broadcast_to_room(&room, &closed_event(&room)).await;
        let delivered = hub.broadcast_to_room(&room, &closed_event(&room)).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(!hub.presence().is_attached(slow.id).await);
        assert!(fast_rx.recv().await.is_some());
        assert!(fast_rx.recv().await.is_some());
        assert_eq!(hub.presence().online_in_room(&room).await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_to_user_preserves_order() {
        // テスト項目: 同一チャンネルへのイベントは送信順に届く
        let hub = hub();
        let (tx, mut rx) = mpsc::channel(8);
        hub.presence().attach(user(1, "alice"), tx).await;

        for name in ["biology", "chemistry", "physics"] {
            let event = Event::OnlineUsersUpdate {
                scope: PresenceScope::Group,
                name: name.to_string(),
                users: Vec::new(),
            };
            hub.send_to_user(UserId::new(1), &event).await;
        }

        for name in ["biology", "chemistry", "physics"] {
            let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["name"], name);
        }
    }

    #[tokio::test]
    async fn test_closed_receiver_is_detached() {
        let hub = hub();
        let (tx, rx) = mpsc::channel(8);
        let attachment = hub.presence().attach(user(1, "alice"), tx).await;
        drop(rx);

        let delivered = hub
            .send_to_user(UserId::new(1), &closed_event(&SessionIdFactory::generate()))
            .await;

        assert_eq!(delivered, 0);
        assert!(!hub.presence().is_attached(attachment.id).await);
    }
}
