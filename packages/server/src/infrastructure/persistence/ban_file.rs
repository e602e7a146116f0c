//! JSON ban snapshot.
//!
//! Two encodings exist on disk:
//!
//! ```text
//! ["10.0.0.1", "10.0.0.2"]                      // legacy: addresses only
//! { "10.0.0.1": "spam", "10.0.0.2": "flood" }    // current: address -> reason
//! ```
//!
//! Both decode into [`BanSnapshot`]; writes always use the current form.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BanEntry, BanReason, BanSnapshotStore, PersistenceError, RemoteAddr};

/// Persisted ban list in either of its encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BanSnapshot {
    Legacy(Vec<String>),
    Current(BTreeMap<String, String>),
}

impl BanSnapshot {
    pub fn from_entries(entries: &[BanEntry]) -> Self {
        BanSnapshot::Current(
            entries
                .iter()
                .map(|e| (e.address.to_string(), e.reason.to_string()))
                .collect(),
        )
    }

    /// Convert to domain entries, dropping (and logging) unusable addresses.
    pub fn into_entries(self) -> Vec<BanEntry> {
        let pairs: Vec<(String, BanReason)> = match self {
            BanSnapshot::Legacy(addresses) => addresses
                .into_iter()
                .map(|a| (a, BanReason::default()))
                .collect(),
            BanSnapshot::Current(map) => map
                .into_iter()
                .map(|(a, r)| (a, BanReason::new(r)))
                .collect(),
        };

        pairs
            .into_iter()
            .filter_map(|(address, reason)| match RemoteAddr::new(address.clone()) {
                Ok(address) => Some(BanEntry { address, reason }),
                Err(e) => {
                    tracing::warn!("Skipping ban entry '{}': {}", address, e);
                    None
                }
            })
            .collect()
    }
}

/// Ban snapshot stored as a JSON file (`<data-dir>/banned-ips.json`).
pub struct JsonFileBanStore {
    path: PathBuf,
}

impl JsonFileBanStore {
    pub const FILE_NAME: &'static str = "banned-ips.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    async fn read(&self) -> Result<Option<BanSnapshot>, PersistenceError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| PersistenceError::Format {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl BanSnapshotStore for JsonFileBanStore {
    async fn load(&self) -> Vec<BanEntry> {
        match self.read().await {
            Ok(Some(snapshot)) => snapshot.into_entries(),
            Ok(None) => {
                tracing::info!("No ban list at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Error loading ban list: {}", e);
                Vec::new()
            }
        }
    }

    async fn save(&self, entries: &[BanEntry]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(&BanSnapshot::from_entries(entries)).map_err(
            |e| PersistenceError::Format {
                path: self.path.display().to_string(),
                message: e.to_string(),
            },
        )?;

        // Write-then-rename so a crash never leaves a truncated file behind
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!("Saved {} ban entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}
