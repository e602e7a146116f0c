//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, PushFrame, RemoteAddr, SessionState, outbound_queue},
    infrastructure::dto::websocket::ClientFrame,
    ui::state::AppState,
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// `GET /ws`
///
/// ban されたアドレスはアップグレード前に 403 で拒否する。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let addr = resolve_remote_addr(&headers, peer, state.trust_forwarded_for);

    if let Err(e) = state.connect_session.admit(&addr).await {
        tracing::info!("Blocked connection from {}: {}", addr, e);
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, addr)))
}

/// 接続元アドレスを決定
///
/// プロキシを信頼する設定の場合のみ `X-Forwarded-For` の先頭を使う。
pub fn resolve_remote_addr(
    headers: &HeaderMap,
    peer: SocketAddr,
    trust_forwarded_for: bool,
) -> RemoteAddr {
    if trust_forwarded_for {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| RemoteAddr::new(first).ok());
        if let Some(addr) = forwarded {
            return addr;
        }
    }
    RemoteAddr::from(peer.ip())
}

/// Spawns a task that drains the connection's outbound queue into the WebSocket sink.
///
/// `PushFrame::Close` sends a close frame and ends the task, which in turn tears the
/// connection down through the normal disconnect path.
fn pusher_loop(
    mut rx: mpsc::Receiver<PushFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                PushFrame::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                PushFrame::Close { reason } => {
                    let close = CloseFrame {
                        code: close_code::NORMAL,
                        reason: reason.into(),
                    };
                    let _ = sender.send(Message::Close(Some(close))).await;
                    break;
                }
            }
        }
    })
}

/// Spawns a task that reads frames from the client until it closes.
///
/// Returns the lifecycle state the connection was left in.
fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    id: ConnectionId,
) -> JoinHandle<SessionState> {
    tokio::spawn(async move {
        let mut lifecycle = SessionState::Active;

        while lifecycle.accepts_frames() {
            let msg = match receiver.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    tracing::debug!("WebSocket error on '{}': {}", id, e);
                    break;
                }
                None => break,
            };

            match msg {
                Message::Text(text) => match ClientFrame::parse(&text) {
                    Ok(frame) => state.handle_frame.execute(&id, frame.into()).await,
                    Err(e) => {
                        tracing::debug!("Failed to parse frame from '{}': {}", id, e);
                        state.handle_frame.reject_malformed(&id).await;
                    }
                },
                Message::Binary(_) => state.handle_frame.reject_malformed(&id).await,
                Message::Close(_) => {
                    tracing::debug!("Client '{}' requested close", id);
                    lifecycle.transition(SessionState::Closing);
                }
                // Ping/pong is handled by the WebSocket protocol
                _ => {}
            }
        }

        lifecycle
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, addr: RemoteAddr) {
    let mut lifecycle = SessionState::Admitted;
    let (tx, rx) = outbound_queue();

    let session = match state.connect_session.execute(addr, tx).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Connection dropped before activation: {}", e);
            lifecycle.transition(SessionState::Closing);
            let close = CloseFrame {
                code: close_code::POLICY,
                reason: e.to_string().into(),
            };
            let _ = socket.send(Message::Close(Some(close))).await;
            return;
        }
    };
    lifecycle.transition(SessionState::Active);
    let id = session.id;

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = receive_loop(receiver, state.clone(), id);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            if let Ok(SessionState::Closing) = result {
                lifecycle.transition(SessionState::Closing);
            }
        }
        _ = &mut send_task => recv_task.abort(),
    };

    lifecycle.transition(SessionState::Closing);
    state.disconnect_session.execute(&id).await;
    lifecycle.transition(SessionState::Closed);
    tracing::debug!("Connection '{}' finished in state {:?}", id, lifecycle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.168.1.10:50000".parse().unwrap()
    }

    #[test]
    fn test_resolve_remote_addr_uses_peer_by_default() {
        // テスト項目: 既定では X-Forwarded-For を無視して TCP の接続元を使う
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        // when (操作):
        let addr = resolve_remote_addr(&headers, peer(), false);

        // then (期待する結果):
        assert_eq!(addr.as_str(), "192.168.1.10");
    }

    #[test]
    fn test_resolve_remote_addr_trusts_first_forwarded_entry() {
        // テスト項目: プロキシを信頼する設定では X-Forwarded-For の先頭を使う
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        // when (操作):
        let addr = resolve_remote_addr(&headers, peer(), true);

        // then (期待する結果):
        assert_eq!(addr.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_resolve_remote_addr_falls_back_without_header() {
        // テスト項目: ヘッダーが無ければ信頼する設定でも TCP の接続元を使う
        // given / when:
        let addr = resolve_remote_addr(&HeaderMap::new(), peer(), true);

        // then (期待する結果):
        assert_eq!(addr.as_str(), "192.168.1.10");
    }

    #[test]
    fn test_resolve_remote_addr_ipv4_mapped_peer() {
        // テスト項目: IPv4 射影 IPv6 の接続元は IPv4 表記になる
        // given (前提条件):
        let mapped: SocketAddr = "[::ffff:10.0.0.5]:50000".parse().unwrap();

        // when (操作):
        let addr = resolve_remote_addr(&HeaderMap::new(), mapped, false);

        // then (期待する結果):
        assert_eq!(addr.as_str(), "10.0.0.5");
    }
}
