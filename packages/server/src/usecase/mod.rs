//! UseCase 層
//!
//! セッションコーディネーターの操作を実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作し、イベントを Publisher に渡します。

pub mod chat;
pub mod cleanup_sessions;
pub mod context;
pub mod error;
pub mod game;
pub mod invitation;
pub mod lobby;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat::ChatUseCase;
pub use cleanup_sessions::{CleanupPolicy, CleanupSessionsUseCase};
pub use context::UseCaseContext;
pub use error::UseCaseError;
pub use game::{GameUseCase, StartedGame};
pub use invitation::InvitationUseCase;
pub use lobby::LobbyUseCase;
