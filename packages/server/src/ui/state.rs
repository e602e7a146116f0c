//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, GetStatsUseCase, HandleFrameUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（受付判定とセッション接続）
    pub connect_session: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断）
    pub disconnect_session: Arc<DisconnectSessionUseCase>,
    /// HandleFrameUseCase（受信フレームの処理）
    pub handle_frame: Arc<HandleFrameUseCase>,
    /// GetStatsUseCase（統計情報の取得）
    pub get_stats: Arc<GetStatsUseCase>,
    /// `X-Forwarded-For` を接続元として信頼するか
    pub trust_forwarded_for: bool,
}
