//! Per-connection send throttling.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::ConnectionId;

/// Classifies inbound chat messages as accepted or throttled.
///
/// A message is accepted when the connection has no record yet or at least
/// `cooldown_millis` have passed since its last *accepted* message. Rejections
/// leave the stored timestamp untouched. Notifying the sender is up to the caller.
pub struct RateLimiter {
    cooldown_millis: i64,
    last_accepted: Mutex<HashMap<ConnectionId, i64>>,
}

impl RateLimiter {
    pub const DEFAULT_COOLDOWN_MILLIS: i64 = 1000;

    pub fn new(cooldown_millis: i64) -> Self {
        Self {
            cooldown_millis,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    pub async fn try_accept(&self, id: &ConnectionId, now_millis: i64) -> bool {
        let mut last_accepted = self.last_accepted.lock().await;
        match last_accepted.get(id) {
            Some(&last) if now_millis - last < self.cooldown_millis => false,
            _ => {
                last_accepted.insert(*id, now_millis);
                true
            }
        }
    }

    /// Drop the record of a connection that has gone away.
    pub async fn forget(&self, id: &ConnectionId) {
        self.last_accepted.lock().await.remove(id);
    }

    pub async fn tracked(&self) -> usize {
        self.last_accepted.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COOLDOWN_MILLIS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_message_is_accepted() {
        // テスト項目: 記録が無い接続の最初のメッセージは受け入れられる
        // given (前提条件):
        let limiter = RateLimiter::default();
        let id = ConnectionId::generate();

        // when (操作):
        let accepted = limiter.try_accept(&id, 10_000).await;

        // then (期待する結果):
        assert!(accepted);
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test]
    async fn test_message_within_cooldown_is_rejected() {
        // テスト項目: クールダウン内の 2 通目は拒否される
        // given (前提条件):
        let limiter = RateLimiter::default();
        let id = ConnectionId::generate();
        limiter.try_accept(&id, 10_000).await;

        // when (操作):
        let accepted = limiter.try_accept(&id, 10_999).await;

        // then (期待する結果):
        assert!(!accepted);
    }

    #[tokio::test]
    async fn test_message_at_cooldown_boundary_is_accepted() {
        // テスト項目: ちょうど 1000ms 経過していれば受け入れられる
        // given (前提条件):
        let limiter = RateLimiter::default();
        let id = ConnectionId::generate();
        limiter.try_accept(&id, 10_000).await;

        // when (操作):
        let accepted = limiter.try_accept(&id, 11_000).await;

        // then (期待する結果):
        assert!(accepted);
    }

    #[tokio::test]
    async fn test_rejection_does_not_reset_window() {
        // テスト項目: 拒否されたメッセージは最終受理時刻を更新しない
        // given (前提条件):
        let limiter = RateLimiter::default();
        let id = ConnectionId::generate();
        limiter.try_accept(&id, 10_000).await;

        // when (操作): 10_500 で拒否された後、11_000 で再送
        let rejected = limiter.try_accept(&id, 10_500).await;
        let accepted = limiter.try_accept(&id, 11_000).await;

        // then (期待する結果):
        assert!(!rejected);
        assert!(accepted);
    }

    #[tokio::test]
    async fn test_connections_are_limited_independently() {
        // テスト項目: 接続ごとに独立して制限される
        // given (前提条件):
        let limiter = RateLimiter::default();
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        limiter.try_accept(&alice, 10_000).await;

        // when (操作):
        let bob_accepted = limiter.try_accept(&bob, 10_001).await;

        // then (期待する結果):
        assert!(bob_accepted);
    }

    #[tokio::test]
    async fn test_forget_removes_record() {
        // テスト項目: forget 後は再び最初のメッセージとして扱われる
        // given (前提条件):
        let limiter = RateLimiter::default();
        let id = ConnectionId::generate();
        limiter.try_accept(&id, 10_000).await;

        // when (操作):
        limiter.forget(&id).await;
        let accepted = limiter.try_accept(&id, 10_001).await;

        // then (期待する結果):
        assert!(accepted);
    }
}
