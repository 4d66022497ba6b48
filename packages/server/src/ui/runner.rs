//! Application wiring and the HTTP server loop.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, sync::mpsc};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    handler,
    signal::shutdown_signal,
    state::{AppState, PushSettings},
};
use crate::{
    config::Config,
    domain::{Catalog, EventPublisher},
    infrastructure::{
        auth::JwtIdentityProvider,
        jobs::{CleanupSessionsJob, JobScheduler},
        realtime::{EventQueue, FanoutHub, PresenceRegistry, QueuedEvent, run_dispatcher},
        repository::{InMemoryCatalog, InMemoryInvitationRepository, InMemorySessionRepository},
    },
    usecase::{CleanupSessionsUseCase, UseCaseContext},
};

/// A fully wired server, ready to be served on a listener.
pub struct Application {
    router: Router,
    hub: Arc<FanoutHub>,
    events: mpsc::UnboundedReceiver<QueuedEvent>,
    scheduler: JobScheduler,
    /// Token issuer, used by development tooling and tests.
    pub identity: Arc<JwtIdentityProvider>,
    pub state: Arc<AppState>,
}

impl Application {
    pub fn build(config: &Config, catalog: InMemoryCatalog) -> Self {
        let (queue, events) = EventQueue::channel();
        let publisher: Arc<dyn EventPublisher> = Arc::new(queue);
        let presence = Arc::new(PresenceRegistry::new(publisher.clone()));
        let hub = Arc::new(FanoutHub::new(presence.clone()));

        let catalog: Arc<dyn Catalog> = Arc::new(catalog);
        let ctx = UseCaseContext::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryInvitationRepository::new()),
            catalog.clone(),
            publisher,
            config.game.chat_history_limit,
        );
        let identity = Arc::new(JwtIdentityProvider::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl_secs,
            catalog,
        ));
        let state = Arc::new(AppState::new(
            ctx.clone(),
            identity.clone(),
            presence,
            PushSettings {
                outbound_buffer: config.game.outbound_buffer,
                heartbeat: Duration::from_secs(config.game.heartbeat_secs),
            },
        ));

        let mut scheduler = JobScheduler::new();
        scheduler.register(CleanupSessionsJob::new(
            CleanupSessionsUseCase::new(ctx, config.cleanup.policy()),
            config.cleanup.interval_secs,
        ));

        Self {
            router: build_router(state.clone()),
            hub,
            events,
            scheduler,
            identity,
            state,
        }
    }

    /// Serve until `shutdown` resolves, then stop background jobs.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Application {
            router,
            hub,
            events,
            mut scheduler,
            ..
        } = self;

        let dispatcher = tokio::spawn(run_dispatcher(events, hub));
        scheduler.start();

        info!(addr = %listener.local_addr()?, "server listening");
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(5)).await;
        dispatcher.abort();
        info!("server stopped");
        result
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handler::health_check))
        // lobby
        .route("/lobby/create", post(handler::create_lobby))
        .route("/lobby/join", post(handler::join_lobby))
        .route("/lobby/join-existing", post(handler::join_existing))
        .route("/lobby/{session_id}", get(handler::lobby_details))
        .route("/lobby/{session_id}/participants", get(handler::lobby_participants))
        .route("/lobby/{session_id}/leave", post(handler::leave_lobby))
        .route("/lobby/{session_id}/start", post(handler::start_from_lobby))
        // game
        .route("/game/start/{session_id}", post(handler::start_game))
        .route("/game/vote", post(handler::vote))
        .route("/game/end-question/{session_id}", post(handler::end_question))
        .route("/game/next-question/{session_id}", post(handler::next_question))
        .route("/game/state/{session_id}", get(handler::game_state))
        .route("/game/result/{session_id}", get(handler::game_result))
        .route("/game/chat", post(handler::send_chat))
        .route("/game/chat/{session_id}", get(handler::chat_history))
        // invitations
        .route("/invitation/send", post(handler::send_invitation))
        .route("/invitation/accept/{id}", post(handler::accept_invitation))
        .route("/invitation/reject/{id}", post(handler::reject_invitation))
        .route("/invitations/pending", get(handler::pending_invitations))
        // push
        .route("/ws", get(handler::websocket_with_subprotocol))
        .route("/ws/{token}", get(handler::websocket_with_path_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the catalog, bind and serve until SIGINT/SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let catalog = InMemoryCatalog::from_json_file(&config.catalog.path)?;
    let app = Application::build(&config, catalog);

    let listener = TcpListener::bind(config.socket_addr()?).await?;
    app.serve(listener, shutdown_signal()).await?;
    Ok(())
}
