//! Shared application state.

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{Catalog, IdentityProvider},
    infrastructure::realtime::PresenceRegistry,
    usecase::{ChatUseCase, GameUseCase, InvitationUseCase, LobbyUseCase, UseCaseContext},
};

/// Settings of the push surface.
#[derive(Debug, Clone, Copy)]
pub struct PushSettings {
    /// Capacity of each channel's outbound queue
    pub outbound_buffer: usize,
    /// Interval between server-sent WebSocket pings
    pub heartbeat: Duration,
}

pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub catalog: Arc<dyn Catalog>,
    pub presence: Arc<PresenceRegistry>,
    pub lobby: LobbyUseCase,
    pub game: GameUseCase,
    pub chat: ChatUseCase,
    pub invitations: InvitationUseCase,
    pub push: PushSettings,
}

impl AppState {
    pub fn new(
        ctx: UseCaseContext,
        identity: Arc<dyn IdentityProvider>,
        presence: Arc<PresenceRegistry>,
        push: PushSettings,
    ) -> Self {
        Self {
            identity,
            catalog: ctx.catalog.clone(),
            presence,
            lobby: LobbyUseCase::new(ctx.clone()),
            game: GameUseCase::new(ctx.clone()),
            chat: ChatUseCase::new(ctx.clone()),
            invitations: InvitationUseCase::new(ctx),
            push,
        }
    }
}
