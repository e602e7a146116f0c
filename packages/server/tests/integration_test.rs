//! Integration tests: the real axum server in-process, driven over WebSocket and HTTP.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use room21_server::{
    bootstrap,
    config::HubConfig,
    domain::{AdminCommand, BanReason},
    usecase::AdminUseCase,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper struct to manage an in-process server
struct TestServer {
    addr: SocketAddr,
    admin: Arc<AdminUseCase>,
    data_dir: TempDir,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server on an ephemeral port with short grace delays
    async fn start() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = HubConfig {
            kick_grace: Duration::from_millis(50),
            ban_grace: Duration::from_millis(50),
            shutdown_grace: Duration::from_millis(50),
            ..HubConfig::default()
        };
        let hub = bootstrap::assemble(config, data_dir.path(), addr.to_string()).await;
        let admin = hub.admin.clone();
        let handle = tokio::spawn(hub.server.serve(listener));

        TestServer {
            addr,
            admin,
            data_dir,
            handle,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connect and consume the welcome notice; returns the assigned name
    async fn join(&self) -> (Client, String) {
        let (mut client, _) = connect_async(self.ws_url()).await.unwrap();
        let welcome = next_of_type(&mut client, "system").await;
        let message = welcome["message"].as_str().unwrap().to_string();
        let name = message
            .rsplit("You are ")
            .next()
            .unwrap()
            .to_string();
        (client, name)
    }

    async fn active_users(&self) -> u64 {
        let stats: Value = reqwest::get(self.http_url("/api/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        stats["activeUsers"].as_u64().unwrap()
    }
}

/// Receive the next JSON event, failing on timeout or close
async fn next_event(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("connection closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip events until one of the given type arrives
async fn next_of_type(client: &mut Client, event_type: &str) -> Value {
    loop {
        let event = next_event(client).await;
        if event["type"] == event_type {
            return event;
        }
    }
}

/// Assert that no event arrives within a short window
async fn expect_silence(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(300), client.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = result {
        panic!("unexpected event: {}", text);
    }
}

/// Wait until the server closes the connection
async fn expect_closed(client: &mut Client) {
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, client.next()).await {
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return,
            Ok(Some(Ok(_))) => continue,
            Err(_) => panic!("connection was not closed"),
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let body: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_two_clients_chat() {
    // テスト項目: A と B が接続し、人数 2 が通知され、A のメッセージがそのまま B に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, alice_name) = server.join().await;
    assert_eq!(next_of_type(&mut alice, "user_count").await["count"], 1);

    // when (操作):
    let (mut bob, _bob_name) = server.join().await;

    // then (期待する結果):
    assert_eq!(next_of_type(&mut bob, "user_count").await["count"], 2);
    let joined = next_event(&mut alice).await;
    assert_eq!(joined["type"], "user_joined");
    assert_eq!(next_event(&mut alice).await["count"], 2);
    assert_eq!(server.active_users().await, 2);

    // when (操作):
    send_json(&mut alice, json!({"message": "hello @B"})).await;

    // then (期待する結果):
    let chat = next_of_type(&mut bob, "chat_message").await;
    assert_eq!(chat["username"], alice_name.as_str());
    assert_eq!(chat["message"], "hello @B");
    assert!(chat["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_too_long_message_errors_sender_only() {
    // テスト項目: 501 文字のメッセージは送信者にだけ error が返り、誰にも配送されない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    let (mut bob, _) = server.join().await;
    next_of_type(&mut bob, "user_count").await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    send_json(&mut alice, json!({"message": "x".repeat(501)})).await;

    // then (期待する結果):
    let error = next_event(&mut alice).await;
    assert_eq!(error["type"], "error");
    assert_eq!(
        error["message"],
        "Message too long. Maximum 500 characters allowed."
    );
    expect_silence(&mut bob).await;
}

#[tokio::test]
async fn test_rate_limit() {
    // テスト項目: クールダウン内の 2 通は 1 回だけ配送され、送信者に 1 回だけ通知される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    let (mut bob, _) = server.join().await;
    next_of_type(&mut bob, "user_count").await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    send_json(&mut alice, json!({"message": "one"})).await;
    send_json(&mut alice, json!({"message": "two"})).await;

    // then (期待する結果):
    assert_eq!(next_event(&mut alice).await["type"], "chat_message");
    let throttled = next_event(&mut alice).await;
    assert_eq!(throttled["type"], "error");
    assert_eq!(
        throttled["message"],
        "You are sending messages too quickly. Please slow down."
    );
    assert_eq!(next_event(&mut bob).await["message"], "one");
    expect_silence(&mut bob).await;
}

#[tokio::test]
async fn test_nick_change() {
    // テスト項目: 有効なニックネームは全員に通知され、不正なものは送信者にだけエラーが返る
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, alice_name) = server.join().await;
    let (mut bob, _) = server.join().await;
    next_of_type(&mut bob, "user_count").await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    send_json(&mut alice, json!({"command": "/nick ab"})).await;

    // then (期待する結果):
    let expected = format!("{} is now known as ab", alice_name);
    for client in [&mut alice, &mut bob] {
        let event = next_event(client).await;
        assert_eq!(event["type"], "nick_change");
        assert_eq!(event["message"], expected.as_str());
    }

    // when (操作):
    send_json(&mut alice, json!({"command": "/nick a b"})).await;

    // then (期待する結果):
    let error = next_event(&mut alice).await;
    assert_eq!(error["type"], "error");
    expect_silence(&mut bob).await;

    send_json(&mut alice, json!({"command": "/users"})).await;
    let list = next_event(&mut alice).await;
    assert_eq!(list["type"], "user_list");
    assert_eq!(list["users"][0]["username"], "ab");
    assert!(list["users"][0]["connectedAt"].is_string());
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    // テスト項目: JSON でないフレームには形式エラーが返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    alice
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    // then (期待する結果):
    let error = next_event(&mut alice).await;
    assert_eq!(error["message"], "Invalid message format");
    send_json(&mut alice, json!({"command": "/clear"})).await;
    assert_eq!(next_event(&mut alice).await["type"], "clear_chat");
}

#[tokio::test]
async fn test_array_frame_is_not_broadcast() {
    // テスト項目: JSON 配列のフレームは形式エラーになり、他の参加者には配送されない
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    let (mut bob, _) = server.join().await;
    next_of_type(&mut bob, "user_count").await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    alice
        .send(Message::Text(r#"["hello from an array"]"#.to_string().into()))
        .await
        .unwrap();

    // then (期待する結果):
    let error = next_event(&mut alice).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Invalid message format");
    expect_silence(&mut bob).await;
}

#[tokio::test]
async fn test_disconnect_notifies_remaining() {
    // テスト項目: 切断すると残りのセッションに user_left と人数が 1 回ずつ通知される
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    let (mut bob, bob_name) = server.join().await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    bob.close(None).await.unwrap();

    // then (期待する結果):
    let left = next_event(&mut alice).await;
    assert_eq!(left["type"], "user_left");
    assert_eq!(left["message"], format!("{} left the chat", bob_name).as_str());
    assert_eq!(next_event(&mut alice).await["count"], 1);
    expect_silence(&mut alice).await;
    assert_eq!(server.active_users().await, 1);
}

#[tokio::test]
async fn test_ban_by_name_then_unban() {
    // テスト項目: 名前で ban すると理由付きの通知の後に切断され、同じアドレスからの接続は拒否される。
    //             unban すると再び接続でき、スナップショットからも消える
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, alice_name) = server.join().await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    server
        .admin
        .execute(AdminCommand::Ban {
            target: alice_name.clone(),
            reason: BanReason::new("spam"),
        })
        .await
        .unwrap();

    // then (期待する結果):
    let ban = next_event(&mut alice).await;
    assert_eq!(ban["type"], "ban_message");
    assert_eq!(ban["reason"], "spam");
    expect_closed(&mut alice).await;

    match connect_async(server.ws_url()).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 403),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("banned address was admitted"),
    }

    // when (操作):
    server
        .admin
        .execute(AdminCommand::Unban("127.0.0.1".to_string()))
        .await
        .unwrap();

    // then (期待する結果):
    let snapshot = std::fs::read_to_string(server.data_dir.path().join("banned-ips.json")).unwrap();
    let snapshot: Value = serde_json::from_str(&snapshot).unwrap();
    assert!(snapshot.get("127.0.0.1").is_none());
    let (_client, _) = server.join().await;
}

#[tokio::test]
async fn test_kick() {
    // テスト項目: kick された本人は通知を受け取った後に切断され、他のセッションには user_left が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, alice_name) = server.join().await;
    let (mut bob, _) = server.join().await;
    next_of_type(&mut alice, "user_joined").await;
    next_of_type(&mut alice, "user_count").await;
    next_of_type(&mut bob, "user_count").await;

    // when (操作):
    let report = server
        .admin
        .execute(AdminCommand::Kick(alice_name.to_lowercase()))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(report, format!("Kicked user: {}", alice_name));
    let notice = next_event(&mut alice).await;
    assert_eq!(
        notice["message"],
        "You have been disconnected by an administrator."
    );
    expect_closed(&mut alice).await;
    assert_eq!(next_event(&mut bob).await["type"], "user_left");
    assert_eq!(next_event(&mut bob).await["count"], 1);
}

#[tokio::test]
async fn test_stop_closes_everything() {
    // テスト項目: stop は警告を配送し、全セッションを閉じてサーバーを停止する
    // given (前提条件):
    let server = TestServer::start().await;
    let (mut alice, _) = server.join().await;
    next_of_type(&mut alice, "user_count").await;

    // when (操作):
    let admin = server.admin.clone();
    let stop = tokio::spawn(async move { admin.execute(AdminCommand::Stop).await });

    // then (期待する結果):
    let warning = next_event(&mut alice).await;
    assert_eq!(warning["style"], "warning");
    expect_closed(&mut alice).await;
    assert!(stop.await.unwrap().is_ok());
    let served = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop");
    assert!(served.unwrap().is_ok());
}
