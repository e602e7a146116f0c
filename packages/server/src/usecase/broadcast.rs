//! Broadcast Engine
//!
//! 接続レジストリのスナップショットを宛先として、イベントを配送します。
//! 宛先の取得はレジストリのロック内、送信はロック外で行われるため、
//! 遅い宛先がレジストリの変更を妨げることはない。

use std::sync::Arc;

use crate::domain::{ChatEvent, ConnectionId, MessagePusher, SessionRepository};

/// イベントの配送（全員 / 送信者以外 / 1 人）
pub struct BroadcastService {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
        }
    }

    /// 登録済みの全セッションに送信し、配送できた数を返す
    pub async fn to_all(&self, event: &ChatEvent) -> usize {
        let targets = self.sessions.all_ids().await;
        self.message_pusher.broadcast(targets, event).await
    }

    /// 送信者以外の全セッションに送信し、配送できた数を返す
    pub async fn to_others(&self, sender: &ConnectionId, event: &ChatEvent) -> usize {
        let targets: Vec<ConnectionId> = self
            .sessions
            .all_ids()
            .await
            .into_iter()
            .filter(|id| id != sender)
            .collect();
        self.message_pusher.broadcast(targets, event).await
    }

    /// 1 つのセッションに送信
    ///
    /// 失敗はログに記録するのみ（相手は通常の切断処理で回収される）。
    pub async fn to_one(&self, target: &ConnectionId, event: &ChatEvent) -> bool {
        match self.message_pusher.push_to(target, event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send '{}' to '{}': {}", event.kind(), target, e);
                false
            }
        }
    }

    /// 現在の接続数を全員に通知
    pub async fn user_count(&self) -> usize {
        let count = self.sessions.count().await;
        self.to_all(&ChatEvent::UserCount { count }).await
    }
}
