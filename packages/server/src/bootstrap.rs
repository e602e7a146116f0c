//! Dependency wiring.
//!
//! Initialize dependencies in order:
//! 1. Persistence (ban snapshot, chat log)
//! 2. Repositories and MessagePusher
//! 3. UseCases
//! 4. AppState and Server

use std::{path::PathBuf, sync::Arc};

use room21_shared::time::{Clock, SystemClock};
use tokio::sync::watch;

use crate::{
    config::HubConfig,
    domain::{BanSnapshotStore, ChatLog, RateLimiter},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        persistence::{FileChatLog, JsonFileBanStore},
        repository::{InMemoryBanRepository, InMemorySessionRepository},
    },
    ui::{Server, state::AppState},
    usecase::{
        AdminUseCase, BroadcastService, ChangeNicknameUseCase, ConnectSessionUseCase,
        DisconnectSessionUseCase, GetStatsUseCase, HandleFrameUseCase, SendMessageUseCase,
    },
};

/// A fully wired hub: the HTTP/WebSocket server and the admin entry point.
pub struct Hub {
    pub server: Server,
    pub admin: Arc<AdminUseCase>,
}

/// Wire a hub that keeps its ban list, chat log and log snapshots in `data_dir`.
///
/// `server_label` is shown by the `status` command and in saved log headers.
/// Must be called from within a tokio runtime.
pub async fn assemble(
    config: HubConfig,
    data_dir: impl Into<PathBuf>,
    server_label: impl Into<String>,
) -> Hub {
    let data_dir = data_dir.into();
    tracing::info!("Using data directory {}", data_dir.display());

    // 1. Persistence
    let ban_store: Arc<dyn BanSnapshotStore> = Arc::new(JsonFileBanStore::in_dir(&data_dir));
    let chat_log: Arc<dyn ChatLog> = Arc::new(FileChatLog::spawn(data_dir));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. Repositories and MessagePusher
    let sessions = Arc::new(InMemorySessionRepository::new());
    let bans = Arc::new(InMemoryBanRepository::load(ban_store).await);
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_cooldown_millis));
    let broadcaster = Arc::new(BroadcastService::new(
        sessions.clone(),
        message_pusher.clone(),
    ));

    // 3. UseCases
    let connect_session = Arc::new(ConnectSessionUseCase::new(
        sessions.clone(),
        bans.clone(),
        message_pusher.clone(),
        broadcaster.clone(),
        chat_log.clone(),
        clock.clone(),
        config.room_name.clone(),
    ));
    let disconnect_session = Arc::new(DisconnectSessionUseCase::new(
        sessions.clone(),
        message_pusher.clone(),
        rate_limiter.clone(),
        broadcaster.clone(),
        chat_log.clone(),
    ));
    let send_message = Arc::new(SendMessageUseCase::new(
        sessions.clone(),
        rate_limiter,
        broadcaster.clone(),
        chat_log.clone(),
        clock.clone(),
        config.max_message_len,
    ));
    let change_nickname = Arc::new(ChangeNicknameUseCase::new(
        sessions.clone(),
        broadcaster.clone(),
        chat_log.clone(),
    ));
    let handle_frame = Arc::new(HandleFrameUseCase::new(
        sessions.clone(),
        broadcaster.clone(),
        send_message,
        change_nickname,
        chat_log.clone(),
        clock.clone(),
    ));
    let get_stats = Arc::new(GetStatsUseCase::new(sessions.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let trust_forwarded_for = config.trust_forwarded_for;
    let admin = Arc::new(AdminUseCase::new(
        sessions,
        bans,
        message_pusher,
        broadcaster,
        chat_log,
        clock,
        config,
        server_label,
        shutdown_tx,
    ));

    // 4. AppState and Server
    let state = AppState {
        connect_session,
        disconnect_session,
        handle_frame,
        get_stats,
        trust_forwarded_for,
    };

    Hub {
        server: Server::new(state, shutdown_rx),
        admin,
    }
}
