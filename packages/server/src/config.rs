//! Hub tunables.

use std::time::Duration;

use crate::domain::{MessageContent, RateLimiter};

/// Settings shared by every usecase of one hub instance.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Shown in the welcome notice and the log snapshot header.
    pub room_name: String,
    pub rate_limit_cooldown_millis: i64,
    pub max_message_len: usize,
    /// Pause between the kick notice and closing the connection.
    pub kick_grace: Duration,
    /// Pause between the ban notice and closing the connection.
    pub ban_grace: Duration,
    /// Pause between the shutdown notice and closing every connection.
    pub shutdown_grace: Duration,
    /// Take the remote address from `X-Forwarded-For` when present.
    pub trust_forwarded_for: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            room_name: "Room21".to_string(),
            rate_limit_cooldown_millis: RateLimiter::DEFAULT_COOLDOWN_MILLIS,
            max_message_len: MessageContent::MAX_LEN,
            kick_grace: Duration::from_secs(1),
            ban_grace: Duration::from_secs(3),
            shutdown_grace: Duration::from_secs(2),
            trust_forwarded_for: false,
        }
    }
}
