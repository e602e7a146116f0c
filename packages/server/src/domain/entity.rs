//! Entities
//!
//! 識別子を持ち、ライフサイクルの中で状態が変化するドメインオブジェクト。

use serde::Serialize;

use super::value_object::{BanReason, ConnectionId, DisplayName, RemoteAddr, Timestamp};

/// Server-side state of one connected client.
///
/// Owned by the session repository: created on admission, mutated on
/// activity and rename, dropped on disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: ConnectionId,
    pub name: DisplayName,
    pub addr: RemoteAddr,
    pub connected_at: Timestamp,
    pub last_activity: Timestamp,
}

impl Session {
    /// 新しい Session を作成
    pub fn new(
        id: ConnectionId,
        name: DisplayName,
        addr: RemoteAddr,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            addr,
            connected_at,
            last_activity: connected_at,
        }
    }

    /// 表示名を変更し、変更前の名前を返す
    pub fn rename(&mut self, new_name: DisplayName) -> DisplayName {
        std::mem::replace(&mut self.name, new_name)
    }

    pub fn touch(&mut self, at: Timestamp) {
        if at > self.last_activity {
            self.last_activity = at;
        }
    }

    /// 接続からの経過分数
    pub fn minutes_connected(&self, now: Timestamp) -> i64 {
        (now.value() - self.connected_at.value()).max(0) / 60_000
    }
}

/// One entry of the ban registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanEntry {
    pub address: RemoteAddr,
    pub reason: BanReason,
}

/// Lifecycle of a connection worker.
///
/// `Admitted → Active → Closing → Closed`. A worker that fails to activate may
/// go straight from `Admitted` to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Admitted,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    /// Move to `next` if the transition is allowed. Returns whether it happened.
    pub fn transition(&mut self, next: SessionState) -> bool {
        use SessionState::*;

        let allowed = matches!(
            (*self, next),
            (Admitted, Active) | (Admitted, Closing) | (Active, Closing) | (Closing, Closed)
        );
        if allowed {
            *self = next;
        }
        allowed
    }

    /// Inbound frames are only processed while `Active`.
    pub fn accepts_frames(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}
