//! Repository and collaborator traits.
//!
//! The use case layer depends on these traits only; concrete implementations
//! live in `infrastructure`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    entity::{Flashcard, Group, Invitation, Subject, User},
    error::{AuthError, InvitationError, RepositoryError},
    session::Session,
    value_object::{GroupName, InvitationId, JoinCode, SessionId, SubjectId, SubjectName, Timestamp, UserId, Username},
};

/// Shared handle to one live session. Its mutex is the per-session critical section.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Authoritative store of live sessions.
///
/// Implementations guard the map with their own lock and must never hold it
/// while a session lock is being acquired.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session, reserving its join code.
    async fn insert(&self, session: Session) -> Result<SessionHandle, RepositoryError>;

    async fn get(&self, id: &SessionId) -> Option<SessionHandle>;

    /// Look up a session by a join code that is still reserved.
    async fn find_by_code(&self, code: &JoinCode) -> Option<SessionHandle>;

    /// Snapshot of every handle currently in the store.
    async fn list(&self) -> Vec<SessionHandle>;

    /// Drop a session and release its join code.
    async fn remove(&self, id: &SessionId) -> Option<SessionHandle>;

    /// Release a join code so that it can be drawn again.
    async fn release_code(&self, code: &JoinCode);

    async fn count(&self) -> usize;
}

/// Mutation applied to an invitation under the store's lock.
pub type InvitationUpdate = Box<dyn FnOnce(&mut Invitation) -> Result<(), InvitationError> + Send>;

/// Store of session invitations.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Return the pending invitation for `(session, invitee)` or create one.
    ///
    /// The boolean is `true` when a new invitation was created.
    async fn create_or_get_pending(
        &self,
        session_id: &SessionId,
        inviter: User,
        invitee: User,
        now: Timestamp,
    ) -> (Invitation, bool);

    async fn get(&self, id: InvitationId) -> Option<Invitation>;

    /// Apply `apply` to the stored invitation atomically.
    ///
    /// Returns `None` for an unknown id. A failed update leaves the record untouched.
    async fn update(
        &self,
        id: InvitationId,
        apply: InvitationUpdate,
    ) -> Option<Result<Invitation, InvitationError>>;

    /// Pending invitations addressed to `invitee`, oldest first.
    async fn pending_for(&self, invitee: UserId) -> Vec<Invitation>;

    /// Forget every invitation to `session_id`.
    async fn remove_for_session(&self, session_id: &SessionId);
}

/// Read-only view of users, groups, subjects and decks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_name(&self, name: &Username) -> Result<Option<User>, RepositoryError>;

    async fn find_group(&self, name: &GroupName) -> Result<Option<Group>, RepositoryError>;

    async fn is_group_member(&self, group: &GroupName, user: UserId) -> Result<bool, RepositoryError>;

    async fn find_subject(
        &self,
        group: &GroupName,
        name: &SubjectName,
    ) -> Result<Option<Subject>, RepositoryError>;

    /// Ordered flashcards of a subject.
    async fn deck(&self, subject: SubjectId) -> Result<Vec<Flashcard>, RepositoryError>;
}

/// Resolves a bearer credential to a user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;
}
