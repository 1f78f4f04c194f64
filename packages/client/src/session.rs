//! One WebSocket session driven from the prompt.

use std::{sync::Arc, thread, time::Duration};

use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use watchparty_server::infrastructure::dto::websocket::{
    CommandEnvelope, CommandType, EventEnvelope, EventType,
};
use watchparty_shared::time::now_unix_millis;

use crate::{
    error::ClientError,
    input::{HELP, InputLine, parse_line},
    playback::{Applied, LocalPlayback},
};

const CLOSE_WAIT: Duration = Duration::from_secs(2);

/// Connect to `url`, ask for the current playback state, then forward prompt
/// commands until the user quits or the server closes the connection.
pub async fn run_client(url: &str, party_id: &str) -> Result<(), ClientError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|source| ClientError::Connect {
            url: url.to_string(),
            source,
        })?;
    tracing::info!("connected to {url}");
    let (mut sender, mut receiver) = ws.split();

    let playback = Arc::new(Mutex::new(LocalPlayback::new()));

    let sync_request = CommandEnvelope::new(CommandType::SyncRequest, party_id);
    sender
        .send(Message::Text(serde_json::to_string(&sync_request)?.into()))
        .await?;

    let reader_playback = playback.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<EventEnvelope>(text.as_str()) {
                        Ok(event) => {
                            let applied = reader_playback
                                .lock()
                                .await
                                .apply(&event, now_unix_millis());
                            println!("{}", describe(&event, &applied));
                        }
                        Err(e) => tracing::warn!("unreadable event: {e}"),
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("server closed the connection: {frame:?}");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("connection error: {e}");
                    break;
                }
            }
        }
    });

    let mut lines = spawn_prompt();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                match parse_line(&line?, party_id, now_unix_millis()) {
                    Ok(InputLine::Command(command)) => {
                        sender
                            .send(Message::Text(serde_json::to_string(&command)?.into()))
                            .await?;
                    }
                    Ok(InputLine::Status) => {
                        let local = playback.lock().await;
                        println!("{}", status(&local, now_unix_millis()));
                    }
                    Ok(InputLine::Help) => println!("{HELP}"),
                    Ok(InputLine::Quit) => break,
                    Ok(InputLine::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
            result = &mut reader => {
                result?;
                return Ok(());
            }
        }
    }

    // A close frame is an explicit leave; the server frees the roster slot.
    if let Err(e) = sender.send(Message::Close(None)).await {
        tracing::debug!("close frame not sent: {e}");
    }
    if tokio::time::timeout(CLOSE_WAIT, &mut reader).await.is_err() {
        reader.abort();
    }
    Ok(())
}

/// Read prompt lines on a plain thread; a pending readline must not hold up
/// runtime shutdown. The channel closes on EOF or Ctrl-C.
fn spawn_prompt() -> mpsc::UnboundedReceiver<Result<String, ReadlineError>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    rx
}

/// One-line rendering of a server event.
pub fn describe(event: &EventEnvelope, applied: &Applied) -> String {
    match event.r#type {
        EventType::ParticipantJoined | EventType::ParticipantLeft => {
            let verb = if event.r#type == EventType::ParticipantJoined {
                "joined"
            } else {
                "left"
            };
            match &event.participant {
                Some(p) => format!("[{verb}] {} ({})", p.participant_id, p.role),
                None => format!("[{verb}]"),
            }
        }
        EventType::Error => format!(
            "[error] {}: {}",
            event.code.as_deref().unwrap_or("UNKNOWN"),
            event.message.as_deref().unwrap_or("")
        ),
        EventType::Sync | EventType::Play | EventType::Pause | EventType::Seek | EventType::Skip => {
            let label = match event.r#type {
                EventType::Sync => "sync",
                EventType::Play => "play",
                EventType::Pause => "pause",
                EventType::Seek => "seek",
                _ => "skip",
            };
            let mut line = format!(
                "[{label}] clip={} position={:.1}s {}",
                event.clip_id.as_deref().unwrap_or("-"),
                event.position.unwrap_or(0.0),
                if event.is_playing == Some(true) {
                    "playing"
                } else {
                    "paused"
                }
            );
            match applied {
                Applied::Repositioned { drift } if event.r#type == EventType::Sync => {
                    line.push_str(&format!(" (corrected {drift:+.1}s)"));
                }
                Applied::InSync { drift } => line.push_str(&format!(" (in sync {drift:+.1}s)")),
                _ => {}
            }
            if let Some(roster) = &event.participants {
                let names: Vec<String> = roster
                    .iter()
                    .map(|p| {
                        let mark = if p.connected { "" } else { "?" };
                        format!("{}:{}{mark}", p.participant_id, p.role)
                    })
                    .collect();
                line.push_str(&format!(" roster=[{}]", names.join(", ")));
            }
            line
        }
    }
}

fn status(local: &LocalPlayback, now: i64) -> String {
    format!(
        "clip={} position={:.1}s {}",
        local.clip_id().unwrap_or("-"),
        local.position_at(now),
        if local.is_playing() { "playing" } else { "paused" }
    )
}
