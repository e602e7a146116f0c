//! InMemory Repository 実装

pub mod ban;
pub mod session;

pub use ban::InMemoryBanRepository;
pub use session::InMemorySessionRepository;
