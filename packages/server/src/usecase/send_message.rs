//! UseCase: チャットメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - サニタイズ、長さ制限、レート制限、全員へのブロードキャスト
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージが全員に配送される
//! - 異常系：空・長すぎるメッセージ、クールダウン中の連続送信
//! - エッジケース：ちょうど上限の長さ、クールダウン経過直後

use std::sync::Arc;

use room21_shared::time::Clock;

use crate::domain::{
    ChatEvent, ChatLog, ConnectionId, MessageContent, RateLimiter, SessionRepository,
    ValidationError,
};

use super::{BroadcastService, error::SendMessageError};

/// チャットメッセージ送信のユースケース
pub struct SendMessageUseCase {
    sessions: Arc<dyn SessionRepository>,
    rate_limiter: Arc<RateLimiter>,
    broadcaster: Arc<BroadcastService>,
    chat_log: Arc<dyn ChatLog>,
    clock: Arc<dyn Clock>,
    max_message_len: usize,
}

impl SendMessageUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        rate_limiter: Arc<RateLimiter>,
        broadcaster: Arc<BroadcastService>,
        chat_log: Arc<dyn ChatLog>,
        clock: Arc<dyn Clock>,
        max_message_len: usize,
    ) -> Self {
        Self {
            sessions,
            rate_limiter,
            broadcaster,
            chat_log,
            clock,
            max_message_len,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信者のクライアント ID
    /// * `raw` - クライアントから受け取ったままのテキスト
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 配送できたセッション数
    /// * `Err(SendMessageError)` - 送信は行われていない
    pub async fn execute(
        &self,
        sender: &ConnectionId,
        raw: &str,
    ) -> Result<usize, SendMessageError> {
        let session = self
            .sessions
            .get(sender)
            .await
            .ok_or_else(|| SendMessageError::SessionNotFound(sender.to_string()))?;

        // 1. サニタイズと長さの検証
        let content = MessageContent::sanitize(raw, self.max_message_len).map_err(|e| match e {
            ValidationError::MessageTooLong { max } => SendMessageError::TooLong { max },
            _ => SendMessageError::Empty,
        })?;

        // 2. レート制限
        if !self
            .rate_limiter
            .try_accept(sender, self.clock.now_millis())
            .await
        {
            tracing::warn!("Rate limit violation by client {}", sender);
            self.chat_log
                .append(&format!("Rate limit violation by client {}", sender));
            return Err(SendMessageError::RateLimited);
        }

        // 3. 全員に配送
        self.chat_log
            .append(&format!("{}: {}", session.name, content.as_str()));
        let delivered = self
            .broadcaster
            .to_all(&ChatEvent::ChatMessage {
                username: session.name,
                message: content,
            })
            .await;

        Ok(delivered)
    }
}
