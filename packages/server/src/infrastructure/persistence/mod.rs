//! File-backed collaborators: the ban snapshot and the chat log.

pub mod ban_file;
pub mod chat_log_file;

pub use ban_file::{BanSnapshot, JsonFileBanStore};
pub use chat_log_file::FileChatLog;
