//! Append-only chat log.

use async_trait::async_trait;

use super::PersistenceError;

/// Write-only text log of notable events (connect, disconnect, chat, admin actions).
///
/// `append` is fire-and-forget: failures are reported through tracing and never
/// reach the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Append one line; the implementation adds the timestamp prefix.
    fn append(&self, entry: &str);

    /// Copy the current log to a timestamped file, prefixed by `header`.
    ///
    /// Returns the file name of the snapshot.
    async fn save_snapshot(&self, header: &str) -> Result<String, PersistenceError>;
}
