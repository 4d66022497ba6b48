//! Event queue between the session coordinator and the fan-out hub.
//!
//! The coordinator publishes while holding a session lock, so publishing is a
//! plain push onto an unbounded queue. A single dispatcher task drains the
//! queue in order and hands each event to the hub.

use std::{collections::BTreeSet, sync::Arc};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::hub::FanoutHub;
use crate::domain::{Audience, Event, EventPublisher};

pub type QueuedEvent = (Audience, Event);

/// Publisher side of the queue.
#[derive(Clone)]
pub struct EventQueue {
    sender: mpsc::UnboundedSender<QueuedEvent>,
}

impl EventQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<QueuedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventPublisher for EventQueue {
    fn publish(&self, audience: Audience, event: Event) {
        if self.sender.send((audience, event)).is_err() {
            warn!("event dispatcher stopped, dropping event");
        }
    }
}

/// Drain the queue until every `EventQueue` handle has been dropped or the
/// task is aborted.
pub async fn run_dispatcher(mut receiver: mpsc::UnboundedReceiver<QueuedEvent>, hub: Arc<FanoutHub>) {
    info!("event dispatcher started");
    while let Some((audience, event)) = receiver.recv().await {
        // Once a game starts only participants may follow the room.
        if let Event::GameStarted {
            session_id,
            participants,
            ..
        } = &event
        {
            let allowed: BTreeSet<_> = participants.iter().map(|p| p.user_id).collect();
            hub.presence().retain_room(session_id, &allowed).await;
        }

        let delivered = hub.deliver(&audience, &event).await;
        debug!(event = event.kind(), delivered, "event dispatched");

        // Closing a session ends its room.
        if let Event::SessionClosed { session_id, .. } = &event {
            hub.presence().close_room(session_id).await;
        }
    }
    info!("event dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{CloseReason, SessionIdFactory, User, UserId, Username},
        infrastructure::realtime::PresenceRegistry,
    };

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order_and_closes_room() {
        // テスト項目: キューに積んだ順にイベントが届き、session_closed の後は部屋が消える
        // given (前提条件):
        let (queue, receiver) = EventQueue::channel();
        let presence = Arc::new(PresenceRegistry::new(Arc::new(queue.clone())));
        let hub = Arc::new(FanoutHub::new(presence.clone()));
        let dispatcher = tokio::spawn(run_dispatcher(receiver, hub));

        let room = SessionIdFactory::generate();
        let (tx, mut rx) = mpsc::channel(16);
        let alice = User::new(UserId::new(1), Username::new("alice".to_string()).unwrap());
        presence.attach(alice, tx).await;
        presence.join_session_room(UserId::new(1), &room).await;

        // when (操作):
        queue.publish(
            Audience::Room(room.clone()),
            Event::SessionClosed {
                session_id: room.clone(),
                reason: CloseReason::HostLeft,
            },
        );

        // then (期待する結果): 入室時の在室通知、次に session_closed
        let first: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first["type"], "online_users_update");
        assert_eq!(first["scope"], "room");
        let second: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(second["type"], "session_closed");

        dispatcher.abort();
    }
}
