//! Data Transfer Objects for the wire protocol.
//!
//! Domain Model とワイヤーフォーマットの変換は `conversion` に集約する。

pub mod conversion;
pub mod http;
pub mod websocket;
