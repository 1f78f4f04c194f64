//! WebSocket integration tests.
//!
//! Drive the playback protocol end to end over real sockets.

mod fixtures;
use fixtures::TestServer;

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use watchparty_server::{
    config::Settings,
    domain::{ParticipantId, PartyId, PartyRecord, Role},
    infrastructure::repository::InMemoryPartyRepository,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer, party_id: &str, participant_id: &str) -> WsStream {
    let (ws, _) = connect_async(server.ws_url(party_id, participant_id))
        .await
        .expect("Failed to connect");
    ws
}

/// Next JSON event, skipping control frames. Panics after a bounded wait.
async fn next_event(ws: &mut WsStream) -> Value {
    try_next_event(ws, Duration::from_secs(2))
        .await
        .expect("Timed out waiting for event")
}

async fn try_next_event(ws: &mut WsStream, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next()).await.ok()??;
        match msg.expect("WebSocket error") {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("Invalid JSON"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

async fn send(ws: &mut WsStream, command: Value) {
    ws.send(Message::Text(command.to_string().into()))
        .await
        .expect("Failed to send");
}

async fn members_repository(party_id: &str, members: &[(&str, Role)]) -> Arc<InMemoryPartyRepository> {
    let repository = Arc::new(InMemoryPartyRepository::new(false));
    let party_id = PartyId::new(party_id.to_string()).unwrap();
    repository.insert_party(PartyRecord::new(party_id.clone())).await;
    for (id, role) in members {
        repository
            .insert_member(&party_id, ParticipantId::new(id.to_string()).unwrap(), *role)
            .await
            .unwrap();
    }
    repository
}

#[tokio::test]
async fn test_first_frame_is_sync_with_roster() {
    // テスト項目: 接続直後の最初のフレームは参加者一覧付きの sync である
    // given (前提条件):
    let server = TestServer::start(19180);

    // when (操作):
    let mut alice = connect(&server, "party-a", "alice").await;

    // then (期待する結果):
    let event = next_event(&mut alice).await;
    assert_eq!(event["type"], "sync");
    assert_eq!(event["party_id"], "party-a");
    assert_eq!(event["position"], 0.0);
    assert_eq!(event["is_playing"], false);
    assert!(event["server_timestamp"].as_i64().unwrap() > 0);
    let participants = event["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["participant_id"], "alice");
    assert_eq!(participants[0]["role"], "host");
}

#[tokio::test]
async fn test_seek_broadcast_then_sync_request() {
    // テスト項目: host の seek が全員に届き、その後の sync-request は position 42 / 停止中を返す
    // given (前提条件):
    let server = TestServer::start(19181);
    let mut host = connect(&server, "party-b", "host").await;
    next_event(&mut host).await;
    let mut viewer = connect(&server, "party-b", "viewer").await;
    next_event(&mut viewer).await;
    assert_eq!(next_event(&mut host).await["type"], "participant-joined");

    // when (操作):
    send(&mut host, json!({"type": "play", "party_id": "party-b", "timestamp": 0})).await;
    send(
        &mut host,
        json!({"type": "seek", "party_id": "party-b", "position": 42.0, "timestamp": 0}),
    )
    .await;

    // then (期待する結果):
    for ws in [&mut host, &mut viewer] {
        assert_eq!(next_event(ws).await["type"], "play");
        let seek = next_event(ws).await;
        assert_eq!(seek["type"], "seek");
        assert_eq!(seek["position"], 42.0);
        assert_eq!(seek["is_playing"], false);
    }

    send(&mut viewer, json!({"type": "sync-request", "party_id": "party-b"})).await;
    let sync = next_event(&mut viewer).await;
    assert_eq!(sync["type"], "sync");
    assert_eq!(sync["position"], 42.0);
    assert_eq!(sync["is_playing"], false);

    // sync は要求者にのみ返る
    assert!(
        try_next_event(&mut host, Duration::from_millis(300))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_viewer_play_is_silently_dropped() {
    // テスト項目: viewer の play は誰にも配送されない
    // given (前提条件):
    let server = TestServer::start(19182);
    let mut host = connect(&server, "party-c", "host").await;
    next_event(&mut host).await;
    let mut viewer = connect(&server, "party-c", "viewer").await;
    next_event(&mut viewer).await;
    next_event(&mut host).await;

    // when (操作):
    send(&mut viewer, json!({"type": "play", "party_id": "party-c"})).await;

    // then (期待する結果):
    assert!(
        try_next_event(&mut host, Duration::from_millis(300))
            .await
            .is_none()
    );
    assert!(
        try_next_event(&mut viewer, Duration::from_millis(300))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_malformed_command_keeps_connection_open() {
    // テスト項目: 不正なコマンドには INVALID_COMMAND が返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start(19183);
    let mut alice = connect(&server, "party-d", "alice").await;
    next_event(&mut alice).await;

    // when (操作): 不正なフレームの直後に sync-request を送る
    send(&mut alice, json!({"type": "seek", "party_id": "party-d", "position": -5})).await;
    send(&mut alice, json!({"type": "sync-request", "party_id": "party-d"})).await;

    // then (期待する結果): 送った順に error、sync の順で届く
    let error = next_event(&mut alice).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "INVALID_COMMAND");
    assert!(error["message"].is_string());
    assert_eq!(next_event(&mut alice).await["type"], "sync");
}

#[tokio::test]
async fn test_skip_from_co_host_reaches_everyone() {
    // テスト項目: co-host の skip(B) で全員に clip_id B / position 0 / 再生中の skip が届く
    // given (前提条件):
    let repository = members_repository(
        "party-e",
        &[("host", Role::Host), ("co", Role::CoHost), ("viewer", Role::Viewer)],
    )
    .await;
    let server = TestServer::start_with_repository(19184, Settings::default(), repository);
    let mut host = connect(&server, "party-e", "host").await;
    next_event(&mut host).await;
    let mut co = connect(&server, "party-e", "co").await;
    next_event(&mut co).await;
    let mut viewer = connect(&server, "party-e", "viewer").await;
    next_event(&mut viewer).await;
    next_event(&mut host).await;
    next_event(&mut host).await;
    next_event(&mut co).await;

    send(&mut host, json!({"type": "skip", "party_id": "party-e", "clip_id": "A"})).await;
    send(&mut host, json!({"type": "seek", "party_id": "party-e", "position": 10})).await;
    send(&mut host, json!({"type": "play", "party_id": "party-e"})).await;
    for ws in [&mut host, &mut co, &mut viewer] {
        for expected in ["skip", "seek", "play"] {
            assert_eq!(next_event(ws).await["type"], expected);
        }
    }

    // when (操作):
    send(&mut co, json!({"type": "skip", "party_id": "party-e", "clip_id": "B"})).await;

    // then (期待する結果):
    for ws in [&mut host, &mut co, &mut viewer] {
        let event = next_event(ws).await;
        assert_eq!(event["type"], "skip");
        assert_eq!(event["clip_id"], "B");
        assert_eq!(event["position"], 0.0);
        assert_eq!(event["is_playing"], true);
    }
}

#[tokio::test]
async fn test_unknown_member_is_forbidden() {
    // テスト項目: 登録されていない参加者は FORBIDDEN を受け取り切断される
    // given (前提条件):
    let repository = members_repository("party-f", &[("host", Role::Host)]).await;
    let mut settings = Settings::default();
    settings.parties.auto_provision = false;
    let server = TestServer::start_with_repository(19185, settings, repository);

    // when (操作):
    let mut mallory = connect(&server, "party-f", "mallory").await;

    // then (期待する結果):
    let error = next_event(&mut mallory).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "FORBIDDEN");
    assert!(
        try_next_event(&mut mallory, Duration::from_secs(1))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_unknown_party_is_reported() {
    // テスト項目: 存在しないパーティへの接続は PARTY_NOT_FOUND を受け取る
    let mut settings = Settings::default();
    settings.parties.auto_provision = false;
    let server = TestServer::start_with(19186, settings);

    let mut alice = connect(&server, "nowhere", "alice").await;

    let error = next_event(&mut alice).await;
    assert_eq!(error["code"], "PARTY_NOT_FOUND");
}

#[tokio::test]
async fn test_end_party_notifies_connections() {
    // テスト項目: パーティ終了で PARTY_ENDED が届き、再参加もできない
    // given (前提条件):
    let server = TestServer::start(19187);
    let client = reqwest::Client::new();
    let mut alice = connect(&server, "party-g", "alice").await;
    next_event(&mut alice).await;

    // when (操作):
    let response = client
        .post(format!("{}/api/parties/party-g/end", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 204);
    let error = next_event(&mut alice).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "PARTY_ENDED");

    let mut bob = connect(&server, "party-g", "bob").await;
    assert_eq!(next_event(&mut bob).await["code"], "PARTY_ENDED");
}

#[tokio::test]
async fn test_reconnect_keeps_role() {
    // テスト項目: 切断後に再接続しても host のまま操作できる
    // given (前提条件):
    let server = TestServer::start(19188);
    let mut host = connect(&server, "party-h", "host").await;
    next_event(&mut host).await;
    let mut viewer = connect(&server, "party-h", "viewer").await;
    next_event(&mut viewer).await;
    drop(host);

    // when (操作):
    let mut host = connect(&server, "party-h", "host").await;
    let snapshot = next_event(&mut host).await;
    send(&mut host, json!({"type": "play", "party_id": "party-h"})).await;

    // then (期待する結果):
    assert_eq!(snapshot["type"], "sync");
    let roster = snapshot["participants"].as_array().unwrap();
    let me = roster
        .iter()
        .find(|p| p["participant_id"] == "host")
        .unwrap();
    assert_eq!(me["role"], "host");
    let mut saw_play = false;
    while let Some(event) = try_next_event(&mut viewer, Duration::from_secs(1)).await {
        if event["type"] == "play" {
            saw_play = true;
            break;
        }
    }
    assert!(saw_play, "viewer should receive play from the reconnected host");
}

#[tokio::test]
async fn test_silent_client_is_marked_disconnected() {
    // テスト項目: 何も送ってこないクライアントは無応答とみなされ、切断状態になる
    // given (前提条件): ping より短い無応答タイムアウト
    let mut settings = Settings::default();
    settings.hub.liveness_timeout_secs = 1;
    settings.hub.ping_interval_secs = 30;
    let server = TestServer::start_with(19189, settings);
    let client = reqwest::Client::new();
    let mut alice = connect(&server, "party-i", "alice").await;
    next_event(&mut alice).await;

    // when (操作): alice は何も送らずに待つ
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut connected = true;
    while connected && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let body: Value = client
            .get(format!("{}/api/parties/party-i", server.base_url()))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        connected = body["participants"][0]["connected"] == true;
    }

    // then (期待する結果): ロスターには残るが、接続は切れている
    assert!(!connected, "silent client should be dropped");
    drop(alice);
}
