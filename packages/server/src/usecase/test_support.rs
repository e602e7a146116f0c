//! usecase テスト用の共通セットアップ

use std::sync::Arc;

use async_trait::async_trait;
use room21_shared::time::{Clock, FixedClock};
use tokio::sync::mpsc;

use crate::{
    domain::{
        BanEntry, BanSnapshotStore, ConnectionId, DisplayName, MessagePusher, MockChatLog,
        PersistenceError, PushFrame, RemoteAddr, Session, SessionRepository, Timestamp,
        outbound_queue,
    },
    infrastructure::{
        dto::websocket::ServerMessage,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryBanRepository, InMemorySessionRepository},
    },
};

use super::BroadcastService;

pub const START_MILLIS: i64 = 1_700_000_000_000;

/// 実際のレジストリと pusher を組み合わせたテスト環境
pub struct Harness {
    pub sessions: Arc<InMemorySessionRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub broadcaster: Arc<BroadcastService>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let broadcaster = Arc::new(BroadcastService::new(sessions.clone(), pusher.clone()));
        Self {
            sessions,
            pusher,
            broadcaster,
            clock: Arc::new(FixedClock::new(START_MILLIS)),
        }
    }

    /// セッションを直接登録し、その送信キューの受信側を返す
    pub async fn join(
        &self,
        name: &str,
        addr: &str,
    ) -> (ConnectionId, mpsc::Receiver<PushFrame>) {
        let id = ConnectionId::generate();
        let (tx, rx) = outbound_queue();
        self.pusher.register_client(id, tx).await;
        self.sessions
            .add(Session::new(
                id,
                DisplayName::new(name.to_string()).unwrap(),
                RemoteAddr::new(addr).unwrap(),
                Timestamp::new(self.clock.now_millis()),
            ))
            .await
            .unwrap();
        self.clock.advance(1);
        (id, rx)
    }
}

/// 何も永続化しないスナップショット保存先
pub struct NullBanStore;

#[async_trait]
impl BanSnapshotStore for NullBanStore {
    async fn load(&self) -> Vec<BanEntry> {
        Vec::new()
    }

    async fn save(&self, _entries: &[BanEntry]) -> Result<(), PersistenceError> {
        Ok(())
    }
}

pub async fn empty_bans() -> Arc<InMemoryBanRepository> {
    Arc::new(InMemoryBanRepository::load(Arc::new(NullBanStore)).await)
}

/// ログ行を検証しない ChatLog
pub fn quiet_log() -> Arc<MockChatLog> {
    let mut log = MockChatLog::new();
    log.expect_append().return_const(());
    Arc::new(log)
}

/// キューに溜まっているテキストフレームを全てデコードして取り出す
pub fn drain(rx: &mut mpsc::Receiver<PushFrame>) -> Vec<ServerMessage> {
    let mut received = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let PushFrame::Text(text) = frame {
            received.push(serde_json::from_str(&text).unwrap());
        }
    }
    received
}

/// キューに溜まっているフレームをデコードせずに全て取り出す
pub fn drain_frames(rx: &mut mpsc::Receiver<PushFrame>) -> Vec<PushFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

/// テキストフレームをデコード
pub fn decode(frame: &PushFrame) -> ServerMessage {
    match frame {
        PushFrame::Text(text) => serde_json::from_str(text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}
