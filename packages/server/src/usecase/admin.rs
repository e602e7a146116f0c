//! UseCase: 管理コマンドの実行
//!
//! 運用者のコンソールから届いた [`AdminCommand`] を実行し、表示用のレポートを返します。
//! 共有状態の変更はすべてセッション側と同じレジストリ・ban リスト・Broadcast Engine を
//! 経由する（管理者専用の抜け道は無い）。
//!
//! ## 強制切断
//!
//! kick / ban / stop は通知を送った後、猶予時間をおいて `MessagePusher::close` で
//! 接続を閉じる。レジストリからの削除とuser_left の通知は、接続側の通常の
//! 切断処理（`DisconnectSessionUseCase`）が 1 回だけ行う。

use std::{
    fmt::Write as _,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use sysinfo::{ProcessExt, System, SystemExt};
use tokio::sync::watch;

use room21_shared::time::{Clock, now_rfc3339};

use crate::{
    config::HubConfig,
    domain::{
        AdminCommand, BanReason, BanRepository, ChatEvent, ChatLog, ConnectionId, MessagePusher,
        RemoteAddr, SessionRepository, Timestamp,
    },
};

use super::{BroadcastService, error::AdminError};

const KICK_CLOSE_REASON: &str = "Kicked by administrator";
const USER_BAN_CLOSE_REASON: &str = "Banned by administrator";
const ADDRESS_BAN_CLOSE_REASON: &str = "IP banned";
const SHUTDOWN_CLOSE_REASON: &str = "Server shutting down";

/// 管理コマンドのユースケース
pub struct AdminUseCase {
    sessions: Arc<dyn SessionRepository>,
    bans: Arc<dyn BanRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    broadcaster: Arc<BroadcastService>,
    chat_log: Arc<dyn ChatLog>,
    clock: Arc<dyn Clock>,
    config: HubConfig,
    /// `status` と `save` に表示する待ち受けアドレス
    server_label: String,
    started_at: Instant,
    /// `stop` が開始されたか（猶予時間中も含む）
    stopping: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl AdminUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        bans: Arc<dyn BanRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcaster: Arc<BroadcastService>,
        chat_log: Arc<dyn ChatLog>,
        clock: Arc<dyn Clock>,
        config: HubConfig,
        server_label: impl Into<String>,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            sessions,
            bans,
            message_pusher,
            broadcaster,
            chat_log,
            clock,
            config,
            server_label: server_label.into(),
            started_at: Instant::now(),
            stopping: AtomicBool::new(false),
            shutdown,
        }
    }

    /// 管理コマンドを実行し、コンソールに表示するレポートを返す
    pub async fn execute(&self, command: AdminCommand) -> Result<String, AdminError> {
        match command {
            AdminCommand::Stop => Ok(self.stop().await),
            AdminCommand::Status => Ok(self.status().await),
            AdminCommand::Users => Ok(self.users().await),
            AdminCommand::Message(text) => Ok(self.message(&text).await),
            AdminCommand::Announce(text) => Ok(self.announce(&text).await),
            AdminCommand::Kick(name) => self.kick(&name).await,
            AdminCommand::Ban { target, reason } => self.ban(&target, reason).await,
            AdminCommand::Unban(address) => self.unban(&address).await,
            AdminCommand::BanList => Ok(self.ban_list().await),
            AdminCommand::Clear => Ok(self.clear().await),
            AdminCommand::Save => self.save().await,
            AdminCommand::Help => Ok(AdminCommand::HELP.to_string()),
            AdminCommand::Noop => Ok(String::new()),
        }
    }

    /// シャットダウンが要求されたか（猶予時間中も true）
    pub fn is_shutting_down(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// 2 回目以降の呼び出しは何もしない
    async fn stop(&self) -> String {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return "Server is already shutting down".to_string();
        }

        tracing::info!("Stopping server...");
        self.broadcaster
            .to_all(&ChatEvent::shutting_down())
            .await;
        self.chat_log.append("[ADMIN] Server shutdown initiated");

        tokio::time::sleep(self.config.shutdown_grace).await;

        let ids = self.sessions.all_ids().await;
        let closed = ids.len();
        for id in ids {
            if let Err(e) = self.message_pusher.close(&id, SHUTDOWN_CLOSE_REASON).await {
                tracing::debug!("Session '{}' already gone at shutdown: {}", id, e);
            }
        }
        self.shutdown.send_replace(true);

        format!("Server stopped ({} session(s) closed)", closed)
    }

    async fn status(&self) -> String {
        let uptime = self.started_at.elapsed().as_secs();
        let memory = match resident_memory_mb() {
            Some(mb) => format!("{}MB", mb),
            None => "unknown".to_string(),
        };

        format!(
            "=== Server Status ===\n\
             Connected users: {}\n\
             Uptime: {}h {}m\n\
             Server: {}\n\
             Memory usage: {}\n\
             ====================",
            self.sessions.count().await,
            uptime / 3600,
            (uptime % 3600) / 60,
            self.server_label,
            memory
        )
    }

    async fn users(&self) -> String {
        let sessions = self.sessions.all().await;
        let now = Timestamp::new(self.clock.now_millis());

        let mut report = format!("=== Connected Users ({}) ===\n", sessions.len());
        for session in &sessions {
            let _ = writeln!(
                report,
                "{} ({}) - {}m ago from {}",
                session.name,
                session.id.short(),
                session.minutes_connected(now),
                session.addr
            );
        }
        report.push_str("=============================");
        report
    }

    async fn message(&self, text: &str) -> String {
        self.broadcaster
            .to_all(&ChatEvent::admin_message(text))
            .await;
        self.chat_log
            .append(&format!("[ADMIN] System message: {}", text));
        format!("System message sent: \"{}\"", text)
    }

    async fn announce(&self, text: &str) -> String {
        self.broadcaster
            .to_all(&ChatEvent::announcement(text))
            .await;
        self.chat_log
            .append(&format!("[ADMIN] Announcement: {}", text));
        format!("Announcement sent: \"{}\"", text)
    }

    async fn kick(&self, name: &str) -> Result<String, AdminError> {
        let session = self
            .sessions
            .find_by_name(name)
            .await
            .ok_or_else(|| AdminError::UserNotFound(name.to_string()))?;

        self.broadcaster
            .to_one(&session.id, &ChatEvent::kicked())
            .await;
        self.close_later(vec![session.id], self.config.kick_grace, KICK_CLOSE_REASON);

        self.chat_log
            .append(&format!("[ADMIN] Kicked user: {}", session.name));
        tracing::info!("Kicked user '{}' ({})", session.name, session.id);
        Ok(format!("Kicked user: {}", session.name))
    }

    /// アドレスまたは表示名を対象に ban する
    ///
    /// 対象がドット区切りの IPv4 アドレスでなければ表示名として検索する。
    /// 名前で解決したセッションには本人向けの通知、同じアドレスの他のセッションには
    /// アドレス ban の通知を 1 通ずつ送り、猶予時間の後に全て切断する。
    async fn ban(&self, target: &str, reason: BanReason) -> Result<String, AdminError> {
        let (address, banned_user) = if RemoteAddr::is_dotted_quad(target) {
            let address = RemoteAddr::new(target)
                .map_err(|e| AdminError::InvalidArgument(e.to_string()))?;
            (address, None)
        } else {
            let session = self
                .sessions
                .find_by_name(target)
                .await
                .ok_or_else(|| AdminError::UserNotFound(target.to_string()))?;
            (session.addr.clone(), Some(session))
        };

        self.bans.ban(address.clone(), reason.clone()).await;
        self.chat_log.append(&format!(
            "[ADMIN] Banned IP: {} - Reason: {}",
            address, reason
        ));

        let mut report = String::new();
        if let Some(user) = &banned_user {
            self.broadcaster
                .to_one(&user.id, &ChatEvent::user_banned(&reason))
                .await;
            self.close_later(vec![user.id], self.config.ban_grace, USER_BAN_CLOSE_REASON);
            self.chat_log.append(&format!(
                "[ADMIN] Banned user: {} (IP: {}) - Reason: {}",
                user.name, address, reason
            ));
            let _ = writeln!(report, "BANNED USER\nUsername: {}", user.name);
        } else {
            report.push_str("IP BANNED\n");
        }

        let others: Vec<ConnectionId> = self
            .sessions
            .find_by_address(&address)
            .await
            .into_iter()
            .map(|session| session.id)
            .filter(|id| banned_user.as_ref().is_none_or(|user| &user.id != id))
            .collect();
        let notice = ChatEvent::address_banned(&reason);
        for id in &others {
            self.broadcaster.to_one(id, &notice).await;
        }
        let disconnected = others.len() + usize::from(banned_user.is_some());
        self.close_later(others, self.config.ban_grace, ADDRESS_BAN_CLOSE_REASON);

        tracing::info!("Banned {} ({}), {} session(s) affected", address, reason, disconnected);
        let _ = write!(
            report,
            "IP Address: {}\nReason: {}\nDisconnected sessions: {}",
            address, reason, disconnected
        );
        Ok(report)
    }

    async fn unban(&self, address: &str) -> Result<String, AdminError> {
        let addr = RemoteAddr::new(address)
            .map_err(|_| AdminError::NotBanned(address.to_string()))?;
        let reason = self
            .bans
            .unban(&addr)
            .await
            .ok_or_else(|| AdminError::NotBanned(address.to_string()))?;

        self.chat_log.append(&format!(
            "[ADMIN] Unbanned IP: {} (was banned for: {})",
            addr, reason
        ));
        tracing::info!("Unbanned {}", addr);
        Ok(format!(
            "IP UNBANNED\nIP Address: {}\nPrevious ban reason: {}",
            addr, reason
        ))
    }

    async fn ban_list(&self) -> String {
        let entries = self.bans.list().await;
        if entries.is_empty() {
            return "=== No Banned IPs ===".to_string();
        }

        let mut report = format!("=== Banned IPs ({}) ===\n", entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let _ = writeln!(
                report,
                "{}. {}\n   Reason: {}",
                index + 1,
                entry.address,
                entry.reason
            );
        }
        report.push_str("========================");
        report
    }

    async fn clear(&self) -> String {
        self.broadcaster.to_all(&ChatEvent::ClearChat).await;
        self.chat_log
            .append("[ADMIN] Chat cleared by administrator");
        "Cleared all user chats".to_string()
    }

    async fn save(&self) -> Result<String, AdminError> {
        let header = format!(
            "=== {} Chat Log ===\nSaved: {}\nServer: {}\n========================\n\n",
            self.config.room_name,
            now_rfc3339(),
            self.server_label
        );
        let file_name = self.chat_log.save_snapshot(&header).await?;

        self.chat_log
            .append(&format!("[ADMIN] Log saved to: {}", file_name));
        Ok(format!("Log saved to: {}", file_name))
    }

    /// 猶予時間の後に接続を閉じる
    fn close_later(&self, ids: Vec<ConnectionId>, grace: Duration, reason: &'static str) {
        if ids.is_empty() {
            return;
        }
        let message_pusher = self.message_pusher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            for id in ids {
                if let Err(e) = message_pusher.close(&id, reason).await {
                    tracing::debug!("Session '{}' already gone before close: {}", id, e);
                }
            }
        });
    }
}

/// このプロセスの常駐メモリ（MB）
fn resident_memory_mb() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_process(pid);
    system.process(pid).map(|process| process.memory() / 1024 / 1024)
}
