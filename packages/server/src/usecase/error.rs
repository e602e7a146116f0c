//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ChatEvent, PersistenceError, RepositoryError, ValidationError};

/// 接続処理のエラー
#[derive(Debug, Error)]
pub enum ConnectError {
    /// ban されたアドレスからの接続
    #[error("address '{0}' is banned")]
    AddressBanned(String),

    #[error("failed to register session: {0}")]
    Registration(#[from] RepositoryError),

    #[error("failed to generate display name: {0}")]
    Identity(#[from] ValidationError),
}

/// チャットメッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("message is empty")]
    Empty,

    #[error("message exceeds {max} characters")]
    TooLong { max: usize },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

impl SendMessageError {
    /// 送信者に返す通知（通知しないエラーは `None`）
    pub fn reply(&self) -> Option<ChatEvent> {
        match self {
            SendMessageError::TooLong { max } => Some(ChatEvent::message_too_long(*max)),
            SendMessageError::RateLimited => Some(ChatEvent::rate_limited()),
            SendMessageError::Empty | SendMessageError::SessionNotFound(_) => None,
        }
    }
}

/// ニックネーム変更のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChangeNicknameError {
    #[error("invalid nickname '{0}'")]
    InvalidNickname(String),

    #[error("session '{0}' not found")]
    SessionNotFound(String),
}

/// 管理コマンドのエラー
///
/// Display がそのままコンソールに表示される。
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("IP {0} is not banned")]
    NotBanned(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Error saving log: {0}")]
    LogSnapshot(#[from] PersistenceError),
}
