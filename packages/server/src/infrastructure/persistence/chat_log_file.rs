//! Append-only chat log file (`<data-dir>/chat.log`).
//!
//! Lines are queued on an unbounded channel and written by a single writer
//! task, so `append` never blocks and lines land in the order they were queued.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
    io::AsyncWriteExt,
    sync::{mpsc, oneshot},
};

use room21_shared::time::now_rfc3339;

use crate::domain::{ChatLog, PersistenceError};

enum LogCommand {
    Line(String),
    Flush(oneshot::Sender<()>),
}

pub struct FileChatLog {
    data_dir: PathBuf,
    log_path: PathBuf,
    tx: mpsc::UnboundedSender<LogCommand>,
}

impl FileChatLog {
    pub const FILE_NAME: &'static str = "chat.log";

    /// Start the writer task. Must be called from within a tokio runtime.
    pub fn spawn(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let log_path = data_dir.join(Self::FILE_NAME);
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(writer_loop(log_path.clone(), rx));

        Self {
            data_dir,
            log_path,
            tx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Wait until every line queued so far has been written.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(LogCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// `chat-log-2024-05-01T12-00-00-000Z.txt`
    fn snapshot_file_name() -> String {
        format!("chat-log-{}.txt", now_rfc3339().replace([':', '.'], "-"))
    }
}

async fn writer_loop(path: PathBuf, mut rx: mpsc::UnboundedReceiver<LogCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            LogCommand::Line(line) => {
                if let Err(e) = append_line(&path, &line).await {
                    tracing::error!("Error writing to log file {}: {}", path.display(), e);
                }
            }
            LogCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

#[async_trait]
impl ChatLog for FileChatLog {
    fn append(&self, entry: &str) {
        let line = format!("[{}] {}\n", now_rfc3339(), entry);
        if self.tx.send(LogCommand::Line(line)).is_err() {
            tracing::warn!("Chat log writer has stopped; dropping entry");
        }
    }

    async fn save_snapshot(&self, header: &str) -> Result<String, PersistenceError> {
        self.flush().await;

        let data = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(PersistenceError::Io {
                    path: self.log_path.display().to_string(),
                    source: e,
                });
            }
        };

        let file_name = Self::snapshot_file_name();
        let save_path = self.data_dir.join(&file_name);
        let write = async {
            tokio::fs::create_dir_all(&self.data_dir).await?;
            tokio::fs::write(&save_path, format!("{}{}", header, data)).await
        };
        write.await.map_err(|e| PersistenceError::Io {
                path: save_path.display().to_string(),
                source: e,
            })?;

        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_writes_timestamped_lines_in_order() {
        // テスト項目: 追記した行がタイムスタンプ付きで順番通りに書き込まれる
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let log = FileChatLog::spawn(dir.path());

        // when (操作):
        log.append("first");
        log.append("second");
        log.flush().await;

        // then (期待する結果):
        let content = tokio::fs::read_to_string(log.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }

    #[tokio::test]
    async fn test_save_snapshot_copies_log_with_header() {
        // テスト項目: スナップショットはヘッダ + 現在のログ内容で保存される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let log = FileChatLog::spawn(dir.path());
        log.append("alice: hello");

        // when (操作):
        let file_name = log.save_snapshot("=== header ===\n\n").await.unwrap();

        // then (期待する結果):
        assert!(file_name.starts_with("chat-log-"));
        assert!(file_name.ends_with(".txt"));
        assert!(!file_name.contains(':'));
        let saved = tokio::fs::read_to_string(dir.path().join(&file_name))
            .await
            .unwrap();
        assert!(saved.starts_with("=== header ===\n\n["));
        assert!(saved.contains("alice: hello"));
    }

    #[tokio::test]
    async fn test_save_snapshot_without_log_writes_header_only() {
        // テスト項目: ログがまだ無くてもヘッダのみのスナップショットが作成される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let log = FileChatLog::spawn(dir.path());

        // when (操作):
        let file_name = log.save_snapshot("header\n").await.unwrap();

        // then (期待する結果):
        let saved = tokio::fs::read_to_string(dir.path().join(&file_name))
            .await
            .unwrap();
        assert_eq!(saved, "header\n");
    }
}
