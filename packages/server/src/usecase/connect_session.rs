//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::admit() / execute() メソッド
//! - ban チェック、表示名の割り当て、welcome / user_joined / user_count の配送
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規セッションの接続
//! - 異常系：ban されたアドレスからの接続
//! - エッジケース：受付後、登録までの間に ban された接続
//! - エッジケース：登録直後に他のタスクの全体配送が割り込む接続

use std::sync::Arc;

use room21_shared::time::Clock;

use crate::domain::{
    BanRepository, ChatEvent, ChatLog, ConnectionId, DisplayNameFactory, MessagePusher,
    PusherChannel, RemoteAddr, Session, SessionRepository, Timestamp,
};

use super::{BroadcastService, error::ConnectError};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    sessions: Arc<dyn SessionRepository>,
    bans: Arc<dyn BanRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcaster: Arc<BroadcastService>,
    chat_log: Arc<dyn ChatLog>,
    clock: Arc<dyn Clock>,
    room_name: String,
}

impl ConnectSessionUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        bans: Arc<dyn BanRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcaster: Arc<BroadcastService>,
        chat_log: Arc<dyn ChatLog>,
        clock: Arc<dyn Clock>,
        room_name: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            bans,
            message_pusher,
            broadcaster,
            chat_log,
            clock,
            room_name: room_name.into(),
        }
    }

    /// 接続の受付判定（WebSocket へのアップグレード前に呼ばれる）
    ///
    /// ban されたアドレスはセッションを作る前に拒否する。
    pub async fn admit(&self, addr: &RemoteAddr) -> Result<(), ConnectError> {
        if self.bans.is_banned(addr).await {
            tracing::warn!("Rejected connection from banned address {}", addr);
            return Err(ConnectError::AddressBanned(addr.to_string()));
        }
        Ok(())
    }

    /// セッション接続を実行
    ///
    /// # Arguments
    ///
    /// * `addr` - 接続元アドレス
    /// * `sender` - クライアントへのイベント送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 登録されたセッション（割り当てられた表示名を含む）
    /// * `Err(ConnectError)` - 接続失敗（状態は何も残らない）
    pub async fn execute(
        &self,
        addr: RemoteAddr,
        sender: PusherChannel,
    ) -> Result<Session, ConnectError> {
        // 1. ban チェック
        self.admit(&addr).await?;

        // 2. セッションを作成
        let session = Session::new(
            ConnectionId::generate(),
            DisplayNameFactory::generate()?,
            addr,
            Timestamp::new(self.clock.now_millis()),
        );
        let id = session.id;

        // 3. MessagePusher に登録し、レジストリに入る前に welcome を積む
        //    （新しいセッションが最初に受け取るイベントは常に welcome）
        self.message_pusher.register_client(id, sender).await;
        self.broadcaster
            .to_one(&id, &ChatEvent::welcome(&self.room_name, &session.name))
            .await;
        if let Err(e) = self.sessions.add(session.clone()).await {
            self.message_pusher.unregister_client(&id).await;
            return Err(e.into());
        }

        // 4. 受付と登録の間に ban された場合は取り消す
        if self.bans.is_banned(&session.addr).await {
            self.sessions.remove(&id).await;
            self.message_pusher.unregister_client(&id).await;
            tracing::warn!(
                "Address {} was banned while connecting, dropping session {}",
                session.addr,
                id
            );
            return Err(ConnectError::AddressBanned(session.addr.to_string()));
        }

        // 5. 他の参加者への通知
        self.broadcaster
            .to_others(&id, &ChatEvent::user_joined(&session.name))
            .await;
        self.broadcaster.user_count().await;

        self.chat_log.append(&format!(
            "Client {} ({}) connected from {}",
            session.name, id, session.addr
        ));
        tracing::info!(
            "Client '{}' ({}) connected from {}",
            session.name,
            id,
            session.addr
        );

        Ok(session)
    }
}
