//! UI 層: axum サーバー、ハンドラー、運用者コンソール

pub mod console;
mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
