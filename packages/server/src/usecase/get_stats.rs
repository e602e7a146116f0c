//! UseCase: 統計情報の取得

use std::sync::Arc;

use crate::domain::SessionRepository;

/// `/api/stats` 用の統計情報を取得するユースケース
pub struct GetStatsUseCase {
    sessions: Arc<dyn SessionRepository>,
}

impl GetStatsUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// 接続中のセッション数を返す
    pub async fn active_users(&self) -> usize {
        self.sessions.count().await
    }
}
