//! Domain errors.

use thiserror::Error;

/// Value Object の生成に失敗したときのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid display name '{0}'")]
    InvalidDisplayName(String),

    #[error("invalid remote address '{0}'")]
    InvalidAddress(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("message exceeds {max} characters")]
    MessageTooLong { max: usize },
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("session '{0}' is already registered")]
    DuplicateSession(String),
}

/// MessagePusher 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// ban スナップショット・チャットログの永続化エラー
///
/// 永続化の失敗はログに記録するのみで、メモリ上の変更は維持される。
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in '{path}': {message}")]
    Format { path: String, message: String },
}
