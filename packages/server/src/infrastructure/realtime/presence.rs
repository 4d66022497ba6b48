//! Presence registry.
//!
//! Owns every live push channel, the study groups each user has joined and
//! the session rooms each user has entered. Membership is tracked per user:
//! a user stays online in a group as long as at least one of their channels
//! is attached.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use tokio::sync::{Notify, RwLock, mpsc};
use tracing::{debug, info};

use crate::domain::{
    Audience, Event, EventPublisher, GroupName, PresenceScope, SessionId, User, UserId, UserRef,
};

/// Identifier of one push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned to the push endpoint on attach.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: ConnectionId,
    /// Notified once the registry drops the channel.
    pub closed: Arc<Notify>,
}

struct Connection {
    user: User,
    sender: mpsc::Sender<String>,
    closed: Arc<Notify>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    connections: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, BTreeSet<ConnectionId>>,
    groups: HashMap<GroupName, BTreeSet<UserId>>,
    rooms: HashMap<SessionId, BTreeSet<UserId>>,
}

impl Registry {
    fn user_refs(&self, members: Option<&BTreeSet<UserId>>) -> Vec<UserRef> {
        members
            .into_iter()
            .flatten()
            .filter_map(|user_id| {
                let conn = self.by_user.get(user_id)?.iter().next()?;
                self.connections.get(conn).map(|c| UserRef::from(&c.user))
            })
            .collect()
    }

    fn channels_of(&self, users: impl IntoIterator<Item = UserId>) -> Vec<(ConnectionId, mpsc::Sender<String>)> {
        users
            .into_iter()
            .filter_map(|user| self.by_user.get(&user))
            .flatten()
            .filter_map(|id| self.connections.get(id).map(|c| (*id, c.sender.clone())))
            .collect()
    }
}

/// Registry of live channels and group/room membership.
pub struct PresenceRegistry {
    inner: RwLock<Registry>,
    publisher: Arc<dyn EventPublisher>,
}

impl PresenceRegistry {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner: RwLock::new(Registry::default()),
            publisher,
        }
    }

    /// Register a new push channel for `user`.
    pub async fn attach(&self, user: User, sender: mpsc::Sender<String>) -> Attachment {
        let mut registry = self.inner.write().await;
        registry.next_id += 1;
        let id = ConnectionId(registry.next_id);
        let closed = Arc::new(Notify::new());
        registry.by_user.entry(user.id).or_default().insert(id);
        info!(connection_id = %id, user_id = %user.id, "channel attached");
        registry.connections.insert(
            id,
            Connection {
                user,
                sender,
                closed: closed.clone(),
            },
        );
        Attachment { id, closed }
    }

    /// Remove a channel. When it was the user's last one, the user leaves
    /// every group and room and each of them is notified.
    pub async fn detach(&self, id: ConnectionId) {
        let mut registry = self.inner.write().await;
        let Some(connection) = registry.connections.remove(&id) else {
            return;
        };
        connection.closed.notify_one();
        let user_id = connection.user.id;
        info!(connection_id = %id, user_id = %user_id, "channel detached");

        let remaining = registry.by_user.get_mut(&user_id).map(|conns| {
            conns.remove(&id);
            conns.len()
        });
        if remaining.unwrap_or(0) > 0 {
            return;
        }
        registry.by_user.remove(&user_id);

        let mut left_groups = Vec::new();
        registry.groups.retain(|group, members| {
            if members.remove(&user_id) {
                left_groups.push(group.clone());
            }
            !members.is_empty()
        });
        let mut left_rooms = Vec::new();
        registry.rooms.retain(|room, members| {
            if members.remove(&user_id) {
                left_rooms.push(room.clone());
            }
            !members.is_empty()
        });

        for group in left_groups {
            self.publish_group(&registry, &group);
        }
        for room in left_rooms {
            self.publish_room(&registry, &room);
        }
    }

    pub async fn join_group(&self, user: UserId, group: &GroupName) {
        let mut registry = self.inner.write().await;
        if !registry.by_user.contains_key(&user) {
            return;
        }
        let added = registry.groups.entry(group.clone()).or_default().insert(user);
        debug!(user_id = %user, group = %group, added, "join group");
        if added {
            self.publish_group(&registry, group);
        } else {
            self.publisher.publish(
                Audience::User(user),
                Self::group_update(&registry, group),
            );
        }
    }

    pub async fn leave_group(&self, user: UserId, group: &GroupName) {
        let mut registry = self.inner.write().await;
        let removed = Self::remove_member(&mut registry.groups, group, user);
        if removed {
            self.publish_group(&registry, group);
        }
    }

    pub async fn join_session_room(&self, user: UserId, session_id: &SessionId) {
        let mut registry = self.inner.write().await;
        if !registry.by_user.contains_key(&user) {
            return;
        }
        let added = registry.rooms.entry(session_id.clone()).or_default().insert(user);
        debug!(user_id = %user, session_id = %session_id, added, "join room");
        if added {
            self.publish_room(&registry, session_id);
        } else {
            self.publisher.publish(
                Audience::User(user),
                Self::room_update(&registry, session_id),
            );
        }
    }

    pub async fn leave_session_room(&self, user: UserId, session_id: &SessionId) {
        let mut registry = self.inner.write().await;
        let removed = Self::remove_member(&mut registry.rooms, session_id, user);
        if removed {
            self.publish_room(&registry, session_id);
        }
    }

    /// Keep only `allowed` users in a session room and return the ones removed.
    ///
    /// The remaining members are notified when anyone was removed.
    pub async fn retain_room(&self, session_id: &SessionId, allowed: &BTreeSet<UserId>) -> Vec<UserId> {
        let mut registry = self.inner.write().await;
        let Some(members) = registry.rooms.get_mut(session_id) else {
            return Vec::new();
        };
        let removed: Vec<UserId> = members.difference(allowed).copied().collect();
        if removed.is_empty() {
            return removed;
        }
        members.retain(|user| allowed.contains(user));
        if members.is_empty() {
            registry.rooms.remove(session_id);
        } else {
            self.publish_room(&registry, session_id);
        }
        info!(session_id = %session_id, removed = removed.len(), "non-participants removed from room");
        removed
    }

    /// Forget a room whose session no longer exists. No notification is sent.
    pub async fn close_room(&self, session_id: &SessionId) {
        self.inner.write().await.rooms.remove(session_id);
    }

    pub async fn online_in_group(&self, group: &GroupName) -> Vec<UserRef> {
        let registry = self.inner.read().await;
        registry.user_refs(registry.groups.get(group))
    }

    pub async fn online_in_room(&self, session_id: &SessionId) -> Vec<UserRef> {
        let registry = self.inner.read().await;
        registry.user_refs(registry.rooms.get(session_id))
    }

    pub async fn is_attached(&self, id: ConnectionId) -> bool {
        self.inner.read().await.connections.contains_key(&id)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Snapshot of the channels an event for `audience` must reach.
    pub async fn channels_for(&self, audience: &Audience) -> Vec<(ConnectionId, mpsc::Sender<String>)> {
        let registry = self.inner.read().await;
        match audience {
            Audience::User(user) => registry.channels_of([*user]),
            Audience::Group(group) => {
                let members: Vec<UserId> = registry.groups.get(group).into_iter().flatten().copied().collect();
                registry.channels_of(members)
            }
            Audience::Room(room) => {
                let members: Vec<UserId> = registry.rooms.get(room).into_iter().flatten().copied().collect();
                registry.channels_of(members)
            }
        }
    }

    fn remove_member<K>(sets: &mut HashMap<K, BTreeSet<UserId>>, key: &K, user: UserId) -> bool
    where
        K: std::hash::Hash + Eq,
    {
        let Some(members) = sets.get_mut(key) else {
            return false;
        };
        let removed = members.remove(&user);
        if members.is_empty() {
            sets.remove(key);
        }
        removed
    }

    fn group_update(registry: &Registry, group: &GroupName) -> Event {
        Event::OnlineUsersUpdate {
            scope: PresenceScope::Group,
            name: group.as_str().to_string(),
            users: registry.user_refs(registry.groups.get(group)),
        }
    }

    fn room_update(registry: &Registry, session_id: &SessionId) -> Event {
        Event::OnlineUsersUpdate {
            scope: PresenceScope::Room,
            name: session_id.as_str().to_string(),
            users: registry.user_refs(registry.rooms.get(session_id)),
        }
    }

    fn publish_group(&self, registry: &Registry, group: &GroupName) {
        self.publisher.publish(
            Audience::Group(group.clone()),
            Self::group_update(registry, group),
        );
    }

    fn publish_room(&self, registry: &Registry, session_id: &SessionId) {
        self.publisher.publish(
            Audience::Room(session_id.clone()),
            Self::room_update(registry, session_id),
        );
    }
}
