//! UseCase 層
//!
//! 1 つの操作につき 1 つの構造体。ドメイン層の trait（Repository / MessagePusher / ChatLog）
//! にのみ依存し、具体的な実装は `bootstrap` で注入されます。

pub mod admin;
pub mod broadcast;
pub mod change_nickname;
pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod get_stats;
pub mod handle_frame;
pub mod send_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use admin::AdminUseCase;
pub use broadcast::BroadcastService;
pub use change_nickname::ChangeNicknameUseCase;
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{AdminError, ChangeNicknameError, ConnectError, SendMessageError};
pub use get_stats::GetStatsUseCase;
pub use handle_frame::HandleFrameUseCase;
pub use send_message::SendMessageUseCase;
