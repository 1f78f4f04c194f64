//! WebSocket connection handlers.
//!
//! Each connection runs two tasks: a reader that decodes commands and hands
//! them to the party hub, and a writer that drains the connection's outbound
//! queue into the socket. Neither ever holds the hub lock across socket I/O.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::time::{Instant, MissedTickBehavior};

use watchparty_shared::time::now_unix_millis;

use crate::{
    domain::{Event, ParticipantId, PartyId, Timestamp},
    hub::{JoinedSession, OutboundReceiver},
    infrastructure::dto::websocket::EventEnvelope,
    ui::state::{AppState, ConnectQuery},
    usecase::{IssueCommandUseCase, JoinPartyUseCase, LeavePartyUseCase, UseCaseError},
};

type SocketSink = SplitSink<WebSocket, Message>;

/// How the reader side ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadEnd {
    /// The client sent a Close frame
    Closed,
    /// Stream error, EOF, or a terminal error
    Dropped,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(party_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let party_id = match PartyId::try_from(party_id.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid party_id format: '{}'", party_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let participant_id = match ParticipantId::try_from(query.participant_id.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid participant_id format: '{}'", query.participant_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, party_id, participant_id)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    party_id: PartyId,
    participant_id: ParticipantId,
) {
    let (mut sender, mut receiver) = socket.split();

    // Use JoinPartyUseCase to handle the join
    let join_usecase = JoinPartyUseCase::new(state.hubs.clone());
    let (hub, session) = match join_usecase.execute(&party_id, participant_id.clone()).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!(
                "'{}' could not join party '{}': {}",
                participant_id,
                party_id,
                e
            );
            let event = error_event(&party_id, &e);
            if let Err(e) = send_event(&mut sender, &event).await {
                tracing::debug!("Failed to report join error: {}", e);
            }
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let JoinedSession {
        connection_id,
        receiver: outbound,
        ..
    } = session;

    let ping_interval = state.settings.ping_interval();
    let liveness_timeout = state.settings.liveness_timeout();

    let issue_usecase = IssueCommandUseCase::new(hub.clone());
    let reader_hub = hub.clone();
    let reader_participant = participant_id.clone();
    let reader_party = party_id.clone();
    // Errors for this connection go through its own outbound queue, behind
    // anything already queued for it.
    let report = move |error: &UseCaseError| {
        let hub = reader_hub.clone();
        let participant = reader_participant.clone();
        let event = error_event(&reader_party, error);
        async move {
            if !hub.send_to_connection(&participant, connection_id, event).await {
                tracing::debug!("Connection {} of '{}' is gone", connection_id, participant);
            }
        }
    };
    let reader_participant = participant_id.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            // Any frame, pongs included, proves the peer is alive.
            let msg = match tokio::time::timeout(liveness_timeout, receiver.next()).await {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(e))) => {
                    tracing::debug!("WebSocket error from '{}': {}", reader_participant, e);
                    return ReadEnd::Dropped;
                }
                Ok(None) => return ReadEnd::Dropped,
                Err(_) => {
                    tracing::warn!(
                        "No frame from '{}' within {:?}, dropping connection",
                        reader_participant,
                        liveness_timeout
                    );
                    return ReadEnd::Dropped;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", reader_participant, text);
                    if let Err(e) = issue_usecase
                        .execute(&reader_participant, text.as_str())
                        .await
                    {
                        tracing::warn!("Command from '{}' failed: {}", reader_participant, e);
                        report(&e).await;
                        if e.is_terminal() {
                            return ReadEnd::Dropped;
                        }
                    }
                }
                Message::Binary(_) => {
                    let e = UseCaseError::MalformedCommand(
                        "binary frames are not supported".to_string(),
                    );
                    report(&e).await;
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", reader_participant);
                    return ReadEnd::Closed;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    let writer_participant = participant_id.clone();
    let mut send_task = tokio::spawn(async move {
        write_loop(
            sender,
            outbound,
            ping_interval,
            liveness_timeout,
            &writer_participant,
        )
        .await;
    });

    // If any one of the tasks completes, abort the other
    let read_end = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or(ReadEnd::Dropped)
        }
        _ = &mut send_task => {
            recv_task.abort();
            ReadEnd::Dropped
        }
    };

    if hub.is_closed().await {
        return;
    }

    let leave_usecase = LeavePartyUseCase::new(state.hubs.clone());
    match read_end {
        ReadEnd::Closed => {
            leave_usecase
                .leave(&hub, &participant_id, connection_id)
                .await;
        }
        ReadEnd::Dropped => {
            leave_usecase
                .disconnect(&hub, &participant_id, connection_id)
                .await;
        }
    }
}

/// Drain the outbound queue into the socket, keeping the connection alive
/// with pings. Every write must land within the liveness window measured
/// from the previous successful write.
async fn write_loop(
    mut sender: SocketSink,
    mut outbound: OutboundReceiver,
    ping_interval: Duration,
    liveness_timeout: Duration,
    participant_id: &ParticipantId,
) {
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_write = Instant::now();

    loop {
        let message = tokio::select! {
            event = outbound.recv() => match event {
                Some(event) => match encode(&event) {
                    Some(message) => message,
                    None => continue,
                },
                // Superseded, evicted, or the hub closed
                None => break,
            },
            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        let remaining = liveness_timeout.saturating_sub(last_write.elapsed());
        match tokio::time::timeout(remaining, sender.send(message)).await {
            Ok(Ok(())) => last_write = Instant::now(),
            Ok(Err(e)) => {
                tracing::debug!("Write to '{}' failed: {}", participant_id, e);
                return;
            }
            Err(_) => {
                tracing::warn!(
                    "No successful write to '{}' within {:?}, dropping connection",
                    participant_id,
                    liveness_timeout
                );
                return;
            }
        }
    }

    let _ = tokio::time::timeout(Duration::from_secs(1), sender.send(Message::Close(None))).await;
}

fn encode(event: &Event) -> Option<Message> {
    match serde_json::to_string(&EventEnvelope::from(event)) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to encode {:?} event: {}", event.kind, e);
            None
        }
    }
}

async fn send_event(sender: &mut SocketSink, event: &Event) -> Result<(), axum::Error> {
    match encode(event) {
        Some(message) => sender.send(message).await,
        None => Ok(()),
    }
}

fn error_event(party_id: &PartyId, error: &UseCaseError) -> Event {
    Event::error(
        party_id.clone(),
        error.code(),
        error.to_string(),
        Timestamp::new(now_unix_millis()),
    )
}
