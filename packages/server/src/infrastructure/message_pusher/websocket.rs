//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信キュー（`PusherChannel`）を管理
//! - イベントをワイヤーフォーマット（JSON）に変換し、キューに積む
//! - 強制切断の指示（`PushFrame::Close`）をキューに積む
//!
//! ## 設計ノート
//!
//! WebSocket 接続の受付と送信キューの生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! キューを実際のソケットに書き出すのも UI 層の writer タスクです。
//!
//! ブロードキャストでは送信先のチャンネルをロック内でコピーし、
//! ロックを解放してから送信する。送信に失敗した宛先（writer タスクが終了済み、
//! またはキューが満杯）はログに記録するのみで、その接続は通常の切断処理で回収される。
//!
//! キューは有界で、積む操作は `try_send` なので待たされることはない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use room21_shared::time::now_rfc3339;

use crate::{
    domain::{ChatEvent, ConnectionId, MessagePushError, MessagePusher, PushFrame, PusherChannel},
    infrastructure::dto::websocket::ServerMessage,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信キュー
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを現在時刻付きの JSON に変換
    fn encode(event: &ChatEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerMessage::from_event(event, now_rfc3339()))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn sender_of(&self, id: &ConnectionId) -> Result<PusherChannel, MessagePushError> {
        self.clients
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MessagePushError::ClientNotFound(id.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel) {
        self.clients.lock().await.insert(id, sender);
        tracing::debug!("Client '{}' registered to MessagePusher", id);
    }

    async fn unregister_client(&self, id: &ConnectionId) {
        self.clients.lock().await.remove(id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", id);
    }

    async fn push_to(&self, id: &ConnectionId, event: &ChatEvent) -> Result<(), MessagePushError> {
        let payload = Self::encode(event)?;
        let sender = self.sender_of(id).await?;

        sender
            .try_send(PushFrame::Text(payload))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed '{}' to client '{}'", event.kind(), id);
        Ok(())
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ChatEvent) -> usize {
        let payload = match Self::encode(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode '{}' event: {}", event.kind(), e);
                return 0;
            }
        };

        let recipients: Vec<(ConnectionId, Option<PusherChannel>)> = {
            let clients = self.clients.lock().await;
            targets
                .into_iter()
                .map(|id| {
                    let sender = clients.get(&id).cloned();
                    (id, sender)
                })
                .collect()
        };

        let mut delivered = 0;
        for (id, sender) in recipients {
            match sender {
                Some(sender) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    if let Err(e) = sender.try_send(PushFrame::Text(payload.clone())) {
                        tracing::warn!("Failed to push '{}' to client '{}': {}", event.kind(), id, e);
                    } else {
                        delivered += 1;
                    }
                }
                None => {
                    tracing::debug!("Client '{}' left during broadcast, skipping", id);
                }
            }
        }

        tracing::debug!("Broadcasted '{}' to {} client(s)", event.kind(), delivered);
        delivered
    }

    /// キューが満杯の場合はチャンネルを手放し、writer タスクが残りを書き出した後に
    /// 接続を終了させる。
    async fn close(&self, id: &ConnectionId, reason: &str) -> Result<(), MessagePushError> {
        let sender = self.sender_of(id).await?;
        match sender.try_send(PushFrame::Close {
            reason: reason.to_string(),
        }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue of '{}' is full, dropping its channel", id);
                self.clients.lock().await.remove(id);
                Ok(())
            }
            Err(e @ TrySendError::Closed(_)) => Err(MessagePushError::PushFailed(e.to_string())),
        }
    }
}
