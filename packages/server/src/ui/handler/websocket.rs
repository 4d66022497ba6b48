//! Push surface.
//!
//! One socket per browser tab. Outbound frames come from the fan-out hub
//! through a bounded queue; inbound messages only manage group and session
//! room membership. Everything else goes through the HTTP endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    domain::{GroupName, SessionId, User},
    infrastructure::dto::websocket::{ClientMessage, ControlMessage},
    ui::{error::ApiError, extractor::subprotocol_token, state::AppState},
};

/// `GET /ws/{token}`
pub async fn websocket_with_path_token(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let user = state.identity.authenticate(&token).await?;
    Ok(upgrade(ws, state, user))
}

/// `GET /ws` with the token in `Sec-WebSocket-Protocol`
pub async fn websocket_with_subprotocol(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = subprotocol_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing token subprotocol".to_string()))?;
    let user = state.identity.authenticate(&token).await?;
    Ok(upgrade(ws.protocols([token]), state, user))
}

fn upgrade(ws: WebSocketUpgrade, state: Arc<AppState>, user: User) -> Response {
    info!(user_id = %user.id, "websocket upgrade accepted");
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(state.push.outbound_buffer);
    let attachment = state.presence.attach(user.clone(), tx.clone()).await;
    let connection_id = attachment.id;

    let closed = attachment.closed.clone();
    let heartbeat = state.push.heartbeat;
    let mut send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(heartbeat);
        ping.tick().await;
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
                _ = closed.notified() => {
                    debug!(connection_id = %connection_id, "channel dropped by registry");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let recv_state = state.clone();
    let recv_user = user.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(connection_id = %connection_id, "websocket error: {}", e);
                    break;
                }
            };
            match msg {
                Message::Text(text) => {
                    let reply = handle_client_message(&recv_state, &recv_user, text.as_str()).await;
                    if let Some(reply) = reply {
                        reply_to(&tx, &reply);
                    }
                }
                Message::Close(_) => {
                    info!(connection_id = %connection_id, "client requested close");
                    break;
                }
                // Pings are answered by the protocol layer.
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.presence.detach(connection_id).await;
    info!(connection_id = %connection_id, user_id = %user.id, "websocket closed");
}

fn reply_to(tx: &mpsc::Sender<String>, reply: &ControlMessage) {
    match serde_json::to_string(reply) {
        Ok(frame) => {
            if tx.try_send(frame).is_err() {
                debug!("control reply dropped");
            }
        }
        Err(e) => warn!("failed to serialize control reply: {}", e),
    }
}

/// Apply one inbound message; returns the reply for this channel, if any.
async fn handle_client_message(state: &AppState, user: &User, text: &str) -> Option<ControlMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(user_id = %user.id, "unsupported client message: {}", e);
            return Some(ControlMessage::Error {
                message: format!("Unsupported message: {e}"),
            });
        }
    };

    match message {
        ClientMessage::Ping | ClientMessage::Heartbeat => Some(ControlMessage::Pong),
        ClientMessage::JoinGroup { group_name } => {
            let group = match GroupName::new(group_name) {
                Ok(group) => group,
                Err(e) => return Some(error_reply(e)),
            };
            match state.catalog.is_group_member(&group, user.id).await {
                Ok(true) => {
                    state.presence.join_group(user.id, &group).await;
                    None
                }
                Ok(false) => Some(ControlMessage::Error {
                    message: format!("Not a member of group {group}"),
                }),
                Err(e) => Some(error_reply(e)),
            }
        }
        ClientMessage::JoinLobby { session_id } | ClientMessage::JoinGame { session_id } => {
            let session_id = match SessionId::new(session_id) {
                Ok(id) => id,
                Err(e) => return Some(error_reply(e)),
            };
            match state.lobby.authorize_room(user, &session_id).await {
                Ok(()) => {
                    state.presence.join_session_room(user.id, &session_id).await;
                    None
                }
                Err(e) => Some(error_reply(e)),
            }
        }
    }
}

fn error_reply(err: impl std::fmt::Display) -> ControlMessage {
    ControlMessage::Error {
        message: err.to_string(),
    }
}
