//! UseCase: ニックネーム変更処理

use std::sync::Arc;

use crate::domain::{ChatEvent, ChatLog, ConnectionId, DisplayName, SessionRepository};

use super::{BroadcastService, error::ChangeNicknameError};

/// ニックネーム変更のユースケース
pub struct ChangeNicknameUseCase {
    sessions: Arc<dyn SessionRepository>,
    broadcaster: Arc<BroadcastService>,
    chat_log: Arc<dyn ChatLog>,
}

impl ChangeNicknameUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        broadcaster: Arc<BroadcastService>,
        chat_log: Arc<dyn ChatLog>,
    ) -> Self {
        Self {
            sessions,
            broadcaster,
            chat_log,
        }
    }

    /// ニックネーム変更を実行し、(変更前, 変更後) の名前を返す
    ///
    /// 不正な名前の場合は状態を変えず、何も配送しない。
    pub async fn execute(
        &self,
        id: &ConnectionId,
        requested: String,
    ) -> Result<(DisplayName, DisplayName), ChangeNicknameError> {
        let new_name = DisplayName::new(requested.clone())
            .map_err(|_| ChangeNicknameError::InvalidNickname(requested))?;

        let old_name = self
            .sessions
            .rename(id, new_name.clone())
            .await
            .map_err(|_| ChangeNicknameError::SessionNotFound(id.to_string()))?;

        self.broadcaster
            .to_all(&ChatEvent::nick_change(&old_name, &new_name))
            .await;
        self.chat_log
            .append(&format!("{} changed nick to {}", old_name, new_name));
        tracing::info!("Client {} renamed '{}' -> '{}'", id, old_name, new_name);

        Ok((old_name, new_name))
    }
}
