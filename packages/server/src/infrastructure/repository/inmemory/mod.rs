//! インメモリ実装
//!
//! プロセスの再起動でセッションと招待はすべて失われます。

pub mod catalog;
pub mod invitation;
pub mod session;

pub use catalog::InMemoryCatalog;
pub use invitation::InMemoryInvitationRepository;
pub use session::InMemorySessionRepository;
