//! Push surface message DTOs.
//!
//! Server-originated events are `domain::Event` serialized as-is; this module
//! only holds what clients may send and the control replies to them.

use serde::{Deserialize, Serialize};

/// Inbound client message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGroup { group_name: String },
    JoinLobby { session_id: String },
    /// Alias of `join_lobby`.
    JoinGame { session_id: String },
    Ping,
    Heartbeat,
}

/// Control reply sent only to the channel that asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Pong,
    Error { message: String },
}
