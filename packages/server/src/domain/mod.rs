//! Domain layer: value objects, entities, events and the traits the hub needs.
//!
//! The domain layer depends on nothing else in the crate; infrastructure
//! provides the trait implementations.

pub mod chat_log;
pub mod command;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod pusher;
pub mod rate_limiter;
pub mod repository;
pub mod value_object;

pub use chat_log::ChatLog;
pub use command::{AdminCommand, AdminParseError, InboundFrame};
pub use entity::{BanEntry, Session, SessionState};
pub use error::{MessagePushError, PersistenceError, RepositoryError, ValidationError};
pub use event::{ChatEvent, NoticeSender, NoticeStyle, RosterEntry};
pub use factory::DisplayNameFactory;
pub use pusher::{
    MessagePusher, OUTBOUND_QUEUE_CAPACITY, PushFrame, PusherChannel, outbound_queue,
};
pub use rate_limiter::RateLimiter;
pub use repository::{BanRepository, BanSnapshotStore, SessionRepository};
pub use value_object::{
    BanReason, ConnectionId, DisplayName, MessageContent, RemoteAddr, Timestamp,
};

#[cfg(test)]
pub use chat_log::MockChatLog;
#[cfg(test)]
pub use pusher::MockMessagePusher;
