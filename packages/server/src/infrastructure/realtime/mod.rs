//! Real-time delivery: presence tracking, fan-out and the event queue.

pub mod dispatcher;
pub mod hub;
pub mod presence;

pub use dispatcher::{EventQueue, QueuedEvent, run_dispatcher};
pub use hub::FanoutHub;
pub use presence::{Attachment, ConnectionId, PresenceRegistry};
