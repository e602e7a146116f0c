//! WebSocket frame formats.
//!
//! Client → server: `{"message": "..."}` or `{"command": "/clear" | "/users" | "/nick <name>"}`.
//! Server → client: a JSON object tagged by `type`, always carrying `timestamp`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound frame as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ClientFrame {
    /// Parse a text frame. Only a JSON object is a valid frame.
    ///
    /// A plain derive would also accept an array mapped by position.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(text)?;
        serde_json::from_value(Value::Object(object))
    }
}

/// Roster line of a `user_list` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub username: String,
    pub connected_at: String,
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    System {
        username: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        timestamp: String,
    },
    ChatMessage {
        username: String,
        message: String,
        timestamp: String,
    },
    UserJoined {
        username: String,
        message: String,
        timestamp: String,
    },
    UserLeft {
        username: String,
        message: String,
        timestamp: String,
    },
    NickChange {
        username: String,
        message: String,
        timestamp: String,
    },
    UserCount {
        count: usize,
        timestamp: String,
    },
    ClearChat {
        timestamp: String,
    },
    Error {
        message: String,
        timestamp: String,
    },
    BanMessage {
        username: String,
        message: String,
        reason: String,
        style: String,
        timestamp: String,
    },
    UserList {
        users: Vec<UserEntry>,
        timestamp: String,
    },
}
