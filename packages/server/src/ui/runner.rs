//! Server runner: routing, binding, and graceful shutdown.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{end_party, get_parties, get_party_detail, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};
use crate::{
    common::SystemClock, config::Settings, hub::HubManager,
    infrastructure::repository::InMemoryPartyRepository,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the router for the given state.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/parties", get(get_parties))
        .route("/api/parties/{party_id}", get(get_party_detail))
        .route("/api/parties/{party_id}/end", post(end_party))
        .route("/ws/parties/{party_id}", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves, then close
/// every hub.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let hubs = state.hubs.clone();
    let app = build_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            // Close sockets so in-flight connections let the server drain.
            hubs.shutdown_all().await;
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Run the server with the bundled in-memory party store.
pub async fn run(settings: Settings) -> Result<(), ServerError> {
    let repository = Arc::new(InMemoryPartyRepository::new(settings.parties.auto_provision));
    let hubs = HubManager::new(repository, Arc::new(SystemClock), settings.hub.clone());
    let state = Arc::new(AppState::new(hubs, settings.hub.clone()));

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!("Listening on {}", address);
    tracing::info!("WebSocket endpoint: ws://{}/ws/parties/{{party_id}}", address);

    serve(listener, state, shutdown_signal()).await
}
