//! Room21 chat hub.
//!
//! WebSocket chat sessions with rate limiting, IP bans and an operator console.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// wiring
pub mod bootstrap;
pub mod config;
