//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、単一の Mutex で全操作を直列化します。
//! ロックはマップ操作の間だけ保持し、送信処理の間は保持しない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, DisplayName, RemoteAddr, RepositoryError, Session, SessionRepository, Timestamp,
};

/// インメモリ Session Repository 実装
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<ConnectionId, Session>>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

/// 接続順（同時刻なら ID 順）に並べる
fn sorted(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| {
        a.connected_at
            .cmp(&b.connected_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    sessions
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn add(&self, session: Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id) {
            return Err(RepositoryError::DuplicateSession(session.id.to_string()));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn remove(&self, id: &ConnectionId) -> Option<Session> {
        self.sessions.lock().await.remove(id)
    }

    async fn get(&self, id: &ConnectionId) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    async fn rename(
        &self,
        id: &ConnectionId,
        new_name: DisplayName,
    ) -> Result<DisplayName, RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| RepositoryError::SessionNotFound(id.to_string()))?;
        Ok(session.rename(new_name))
    }

    async fn touch(&self, id: &ConnectionId, at: Timestamp) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| RepositoryError::SessionNotFound(id.to_string()))?;
        session.touch(at);
        Ok(())
    }

    async fn all(&self) -> Vec<Session> {
        let sessions: Vec<Session> = self.sessions.lock().await.values().cloned().collect();
        sorted(sessions)
    }

    async fn all_ids(&self) -> Vec<ConnectionId> {
        self.sessions.lock().await.keys().copied().collect()
    }

    async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn find_by_name(&self, name: &str) -> Option<Session> {
        let matches: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.name.matches_ignore_case(name))
            .cloned()
            .collect();
        sorted(matches).into_iter().next()
    }

    async fn find_by_address(&self, addr: &RemoteAddr) -> Vec<Session> {
        let matches: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| &s.addr == addr)
            .cloned()
            .collect();
        sorted(matches)
    }
}
