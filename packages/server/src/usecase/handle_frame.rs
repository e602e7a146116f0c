//! UseCase: 受信フレームの処理
//!
//! `Active` なセッションから届いたフレームを分類済みの [`InboundFrame`] として受け取り、
//! コマンド・チャット・不正なフレームを振り分けます。
//! エラーの通知は常に送信者だけに返し、接続は維持される。

use std::sync::Arc;

use room21_shared::time::Clock;

use crate::domain::{
    ChatEvent, ChatLog, ConnectionId, InboundFrame, RosterEntry, SessionRepository, Timestamp,
};

use super::{
    BroadcastService, ChangeNicknameUseCase, SendMessageUseCase, error::ChangeNicknameError,
};

/// 受信フレーム処理のユースケース
pub struct HandleFrameUseCase {
    sessions: Arc<dyn SessionRepository>,
    broadcaster: Arc<BroadcastService>,
    send_message: Arc<SendMessageUseCase>,
    change_nickname: Arc<ChangeNicknameUseCase>,
    chat_log: Arc<dyn ChatLog>,
    clock: Arc<dyn Clock>,
}

impl HandleFrameUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        broadcaster: Arc<BroadcastService>,
        send_message: Arc<SendMessageUseCase>,
        change_nickname: Arc<ChangeNicknameUseCase>,
        chat_log: Arc<dyn ChatLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            broadcaster,
            send_message,
            change_nickname,
            chat_log,
            clock,
        }
    }

    /// フレームを処理
    ///
    /// レジストリに存在しないセッション（切断処理中）からのフレームは無視する。
    pub async fn execute(&self, id: &ConnectionId, frame: InboundFrame) {
        let now = Timestamp::new(self.clock.now_millis());
        if self.sessions.touch(id, now).await.is_err() {
            tracing::debug!("Ignoring frame from closed session '{}'", id);
            return;
        }

        match frame {
            InboundFrame::Clear => self.clear(id).await,
            InboundFrame::ListUsers => self.list_users(id).await,
            InboundFrame::Rename(requested) => self.rename(id, requested).await,
            InboundFrame::Chat(text) => self.chat(id, &text).await,
            InboundFrame::Unrecognized => {
                tracing::debug!("Ignoring unrecognized frame from '{}'", id);
            }
        }
    }

    /// 解析できなかったフレームを送信者に通知
    pub async fn reject_malformed(&self, id: &ConnectionId) {
        tracing::warn!("Malformed frame from '{}'", id);
        self.broadcaster
            .to_one(id, &ChatEvent::invalid_format())
            .await;
    }

    async fn clear(&self, id: &ConnectionId) {
        // 要求した本人の表示だけを消す（サーバー側のログは残る）
        self.broadcaster.to_one(id, &ChatEvent::ClearChat).await;
        if let Some(session) = self.sessions.get(id).await {
            self.chat_log
                .append(&format!("Chat cleared by {}", session.name));
        }
    }

    async fn list_users(&self, id: &ConnectionId) {
        let users = self
            .sessions
            .all()
            .await
            .iter()
            .map(RosterEntry::from)
            .collect();
        self.broadcaster
            .to_one(id, &ChatEvent::UserList { users })
            .await;
    }

    async fn rename(&self, id: &ConnectionId, requested: String) {
        match self.change_nickname.execute(id, requested).await {
            Ok(_) => {}
            Err(ChangeNicknameError::InvalidNickname(name)) => {
                tracing::debug!("Rejected nickname '{}' from '{}'", name, id);
                self.broadcaster
                    .to_one(id, &ChatEvent::invalid_nickname())
                    .await;
            }
            Err(e) => tracing::debug!("Nickname change for '{}' failed: {}", id, e),
        }
    }

    async fn chat(&self, id: &ConnectionId, text: &str) {
        if let Err(e) = self.send_message.execute(id, text).await {
            tracing::debug!("Message from '{}' not sent: {}", id, e);
            if let Some(reply) = e.reply() {
                self.broadcaster.to_one(id, &reply).await;
            }
        }
    }
}
