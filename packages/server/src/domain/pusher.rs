//! MessagePusher trait 定義
//!
//! クライアントへのイベント送信を抽象化します。
//! 送信はベストエフォートで、1 つの宛先への失敗は他の宛先への配送を妨げない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatEvent, ConnectionId, MessagePushError};

/// One item on a connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    /// Serialized event, sent as a text frame.
    Text(String),
    /// Close the connection with the given reason.
    Close { reason: String },
}

/// Outbound queue of one connection, drained by its writer task.
///
/// Bounded: pushes to a full queue fail immediately instead of waiting on a
/// client that stopped reading.
pub type PusherChannel = mpsc::Sender<PushFrame>;

/// Frames a connection may have queued before further pushes fail.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Create the outbound queue for a new connection.
pub fn outbound_queue() -> (PusherChannel, mpsc::Receiver<PushFrame>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除
    async fn unregister_client(&self, id: &ConnectionId);

    /// 特定のクライアントにイベントを送信
    async fn push_to(&self, id: &ConnectionId, event: &ChatEvent) -> Result<(), MessagePushError>;

    /// 複数のクライアントにイベントを送信し、配送できた数を返す
    ///
    /// 個々の送信失敗はログに記録するのみで、呼び出し元にはエラーを返さない。
    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ChatEvent) -> usize;

    /// クライアントの接続を閉じるよう指示
    async fn close(&self, id: &ConnectionId, reason: &str) -> Result<(), MessagePushError>;
}
