//! Utilities shared by the Room21 binaries: logging setup and time handling.

pub mod logger;
pub mod time;
