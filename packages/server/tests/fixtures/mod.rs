//! Test fixtures: an in-process server bound to a fixed local port.

#![allow(dead_code)]

use std::{net::TcpListener as StdTcpListener, sync::Arc, thread};

use tokio::sync::oneshot;
use watchparty_server::{
    common::SystemClock,
    config::Settings,
    hub::HubManager,
    infrastructure::repository::InMemoryPartyRepository,
    ui::{self, state::AppState},
};

/// A running server; stopped when dropped.
pub struct TestServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start with default settings (parties and members auto-provisioned).
    pub fn start(port: u16) -> Self {
        Self::start_with(port, Settings::default())
    }

    pub fn start_with(port: u16, settings: Settings) -> Self {
        let repository = Arc::new(InMemoryPartyRepository::new(
            settings.parties.auto_provision,
        ));
        Self::start_with_repository(port, settings, repository)
    }

    /// Start on top of a pre-populated party store.
    pub fn start_with_repository(
        port: u16,
        settings: Settings,
        repository: Arc<InMemoryPartyRepository>,
    ) -> Self {
        // Bind before returning so callers can connect immediately.
        let listener =
            StdTcpListener::bind(("127.0.0.1", port)).expect("Failed to bind test port");
        listener
            .set_nonblocking(true)
            .expect("Failed to set non-blocking");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("Failed to build runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)
                    .expect("Failed to convert listener");
                let hubs = HubManager::new(
                    repository,
                    Arc::new(SystemClock),
                    settings.hub.clone(),
                );
                let state = Arc::new(AppState::new(hubs, settings.hub.clone()));
                let shutdown = async move {
                    let _ = shutdown_rx.await;
                };
                if let Err(e) = ui::serve(listener, state, shutdown).await {
                    eprintln!("test server error: {e}");
                }
            });
        });

        Self {
            port,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self, party_id: &str, participant_id: &str) -> String {
        format!(
            "ws://127.0.0.1:{}/ws/parties/{}?participant_id={}",
            self.port, party_id, participant_id
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
