//! Handler modules for HTTP and WebSocket endpoints.

pub mod chat;
pub mod game;
pub mod health;
pub mod invitation;
pub mod lobby;
pub mod websocket;

pub use chat::{chat_history, send_chat};
pub use game::{end_question, game_result, game_state, next_question, start_game, vote};
pub use health::health_check;
pub use invitation::{accept_invitation, pending_invitations, reject_invitation, send_invitation};
pub use lobby::{
    create_lobby, join_existing, join_lobby, leave_lobby, lobby_details, lobby_participants,
    start_from_lobby,
};
pub use websocket::{websocket_with_path_token, websocket_with_subprotocol};
