//! UseCase: セッション切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - レジストリからの削除、user_left / user_count の配送
//!
//! ### なぜこのテストが必要か
//! - クライアント側の切断と管理者の kick が同時に起きても、
//!   削除と user_left の通知が 1 回だけであることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：セッションの切断と通知
//! - エッジケース：最後のセッションの切断（通知対象なし）
//! - エッジケース：同じセッションへの同時切断

use std::sync::Arc;

use crate::domain::{
    ChatEvent, ChatLog, ConnectionId, MessagePusher, RateLimiter, Session, SessionRepository,
};

use super::BroadcastService;

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    rate_limiter: Arc<RateLimiter>,
    broadcaster: Arc<BroadcastService>,
    chat_log: Arc<dyn ChatLog>,
}

impl DisconnectSessionUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        rate_limiter: Arc<RateLimiter>,
        broadcaster: Arc<BroadcastService>,
        chat_log: Arc<dyn ChatLog>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            rate_limiter,
            broadcaster,
            chat_log,
        }
    }

    /// セッション切断を実行
    ///
    /// 何度呼ばれても、実際に後始末を行うのはレジストリから削除できた 1 回だけ。
    ///
    /// # Returns
    ///
    /// * `Some(Session)` - この呼び出しで削除されたセッション
    /// * `None` - 既に切断済み
    pub async fn execute(&self, id: &ConnectionId) -> Option<Session> {
        // 1. レジストリから削除（存在すれば）
        let Some(session) = self.sessions.remove(id).await else {
            tracing::debug!("Session '{}' already disconnected", id);
            return None;
        };

        // 2. 送信キューとレート制限の記録を破棄
        self.message_pusher.unregister_client(id).await;
        self.rate_limiter.forget(id).await;

        // 3. 残りのセッションに通知
        self.broadcaster
            .to_all(&ChatEvent::user_left(&session.name))
            .await;
        self.broadcaster.user_count().await;

        self.chat_log
            .append(&format!("Client {} ({}) disconnected", session.name, id));
        tracing::info!("Client '{}' ({}) disconnected", session.name, id);

        Some(session)
    }
}
