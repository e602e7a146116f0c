//! Outbound events.
//!
//! Everything the hub tells a client is one of these. They are built by the
//! usecases, stamped and serialized by the message pusher, and never stored.

use super::{
    entity::Session,
    value_object::{BanReason, DisplayName, MessageContent, Timestamp},
};

/// Who a system-originated notice is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSender {
    System,
    Admin,
}

impl NoticeSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeSender::System => "System",
            NoticeSender::Admin => "Admin",
        }
    }
}

/// Client-side styling hint for system notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStyle {
    Info,
    Success,
    Warning,
    Error,
    Ban,
}

impl NoticeStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeStyle::Info => "info",
            NoticeStyle::Success => "success",
            NoticeStyle::Warning => "warning",
            NoticeStyle::Error => "error",
            NoticeStyle::Ban => "ban",
        }
    }
}

/// Roster line of a `UserList` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub username: DisplayName,
    pub connected_at: Timestamp,
}

impl From<&Session> for RosterEntry {
    fn from(session: &Session) -> Self {
        Self {
            username: session.name.clone(),
            connected_at: session.connected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    System {
        sender: NoticeSender,
        message: String,
        style: Option<NoticeStyle>,
    },
    ChatMessage {
        username: DisplayName,
        message: MessageContent,
    },
    UserJoined {
        message: String,
    },
    UserLeft {
        message: String,
    },
    NickChange {
        message: String,
    },
    UserCount {
        count: usize,
    },
    ClearChat,
    Error {
        message: String,
    },
    Ban {
        message: String,
        reason: BanReason,
    },
    UserList {
        users: Vec<RosterEntry>,
    },
}

impl ChatEvent {
    pub fn welcome(room_name: &str, name: &DisplayName) -> Self {
        ChatEvent::System {
            sender: NoticeSender::System,
            message: format!("Welcome to {}! You are {}", room_name, name),
            style: None,
        }
    }

    pub fn user_joined(name: &DisplayName) -> Self {
        ChatEvent::UserJoined {
            message: format!("{} joined the chat", name),
        }
    }

    pub fn user_left(name: &DisplayName) -> Self {
        ChatEvent::UserLeft {
            message: format!("{} left the chat", name),
        }
    }

    pub fn nick_change(old: &DisplayName, new: &DisplayName) -> Self {
        ChatEvent::NickChange {
            message: format!("{} is now known as {}", old, new),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatEvent::Error {
            message: message.into(),
        }
    }

    pub fn rate_limited() -> Self {
        Self::error("You are sending messages too quickly. Please slow down.")
    }

    pub fn message_too_long(max: usize) -> Self {
        Self::error(format!(
            "Message too long. Maximum {} characters allowed.",
            max
        ))
    }

    pub fn invalid_format() -> Self {
        Self::error("Invalid message format")
    }

    pub fn invalid_nickname() -> Self {
        Self::error(format!(
            "Invalid nickname. Use only letters, numbers, _ and - (max {} chars)",
            DisplayName::MAX_LEN
        ))
    }

    pub fn admin_message(text: &str) -> Self {
        ChatEvent::System {
            sender: NoticeSender::Admin,
            message: text.to_string(),
            style: Some(NoticeStyle::Info),
        }
    }

    pub fn announcement(text: &str) -> Self {
        ChatEvent::System {
            sender: NoticeSender::System,
            message: format!("ANNOUNCEMENT: {}", text),
            style: Some(NoticeStyle::Success),
        }
    }

    pub fn kicked() -> Self {
        ChatEvent::System {
            sender: NoticeSender::System,
            message: "You have been disconnected by an administrator.".to_string(),
            style: Some(NoticeStyle::Error),
        }
    }

    pub fn shutting_down() -> Self {
        ChatEvent::System {
            sender: NoticeSender::System,
            message: "Server is shutting down for maintenance. Please reconnect in a few moments."
                .to_string(),
            style: Some(NoticeStyle::Warning),
        }
    }

    /// Sent to the session a ban-by-name was resolved from.
    pub fn user_banned(reason: &BanReason) -> Self {
        ChatEvent::Ban {
            message: "You have been banned from this server".to_string(),
            reason: reason.clone(),
        }
    }

    /// Sent to every other session sharing a banned address.
    pub fn address_banned(reason: &BanReason) -> Self {
        ChatEvent::Ban {
            message: "Your IP address has been banned from this server".to_string(),
            reason: reason.clone(),
        }
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::System { .. } => "system",
            ChatEvent::ChatMessage { .. } => "chat_message",
            ChatEvent::UserJoined { .. } => "user_joined",
            ChatEvent::UserLeft { .. } => "user_left",
            ChatEvent::NickChange { .. } => "nick_change",
            ChatEvent::UserCount { .. } => "user_count",
            ChatEvent::ClearChat => "clear_chat",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Ban { .. } => "ban_message",
            ChatEvent::UserList { .. } => "user_list",
        }
    }
}
