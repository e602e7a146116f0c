//! Conversion logic between DTOs and domain types.

use crate::domain::{ChatEvent, InboundFrame, NoticeSender, NoticeStyle};
use crate::infrastructure::dto::websocket::{ClientFrame, ServerMessage, UserEntry};

// ========================================
// DTO → Domain
// ========================================

impl From<ClientFrame> for InboundFrame {
    fn from(dto: ClientFrame) -> Self {
        InboundFrame::classify(dto.command.as_deref(), dto.message.as_deref())
    }
}

// ========================================
// Domain → DTO
// ========================================

impl ServerMessage {
    /// Build the wire frame for `event`, stamped with `timestamp` (ISO-8601).
    pub fn from_event(event: &ChatEvent, timestamp: String) -> Self {
        let system = NoticeSender::System.as_str().to_string();

        match event {
            ChatEvent::System {
                sender,
                message,
                style,
            } => ServerMessage::System {
                username: sender.as_str().to_string(),
                message: message.clone(),
                style: style.map(|s| s.as_str().to_string()),
                timestamp,
            },
            ChatEvent::ChatMessage { username, message } => ServerMessage::ChatMessage {
                username: username.as_str().to_string(),
                message: message.as_str().to_string(),
                timestamp,
            },
            ChatEvent::UserJoined { message } => ServerMessage::UserJoined {
                username: system,
                message: message.clone(),
                timestamp,
            },
            ChatEvent::UserLeft { message } => ServerMessage::UserLeft {
                username: system,
                message: message.clone(),
                timestamp,
            },
            ChatEvent::NickChange { message } => ServerMessage::NickChange {
                username: system,
                message: message.clone(),
                timestamp,
            },
            ChatEvent::UserCount { count } => ServerMessage::UserCount {
                count: *count,
                timestamp,
            },
            ChatEvent::ClearChat => ServerMessage::ClearChat { timestamp },
            ChatEvent::Error { message } => ServerMessage::Error {
                message: message.clone(),
                timestamp,
            },
            ChatEvent::Ban { message, reason } => ServerMessage::BanMessage {
                username: system,
                message: message.clone(),
                reason: reason.as_str().to_string(),
                style: NoticeStyle::Ban.as_str().to_string(),
                timestamp,
            },
            ChatEvent::UserList { users } => ServerMessage::UserList {
                users: users
                    .iter()
                    .map(|entry| UserEntry {
                        username: entry.username.as_str().to_string(),
                        connected_at: entry.connected_at.to_rfc3339(),
                    })
                    .collect(),
                timestamp,
            },
        }
    }
}
