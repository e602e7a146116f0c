//! InMemory Ban Repository 実装
//!
//! ban リストをメモリ上の BTreeMap で保持し、変更のたびにスナップショットを書き出します。
//!
//! ## ロックの順序
//!
//! `persist` → `bans` の順に取得する。スナップショットの書き出しは `bans` を
//! 解放してから行うため、接続受付時の `is_banned` はファイル I/O を待たない。
//! `persist` を保持している間に変更と書き出しを行うので、書き出し順は変更順と一致する。

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{BanEntry, BanReason, BanRepository, BanSnapshotStore, RemoteAddr};

/// インメモリ Ban Repository 実装
pub struct InMemoryBanRepository {
    bans: Mutex<BTreeMap<RemoteAddr, BanReason>>,
    persist: Mutex<()>,
    store: Arc<dyn BanSnapshotStore>,
}

impl InMemoryBanRepository {
    /// スナップショットから ban リストを読み込んで作成
    pub async fn load(store: Arc<dyn BanSnapshotStore>) -> Self {
        let entries = store.load().await;
        tracing::info!("Loaded {} banned addresses", entries.len());

        let bans = entries
            .into_iter()
            .map(|entry| (entry.address, entry.reason))
            .collect();

        Self {
            bans: Mutex::new(bans),
            persist: Mutex::new(()),
            store,
        }
    }

    fn to_entries(bans: &BTreeMap<RemoteAddr, BanReason>) -> Vec<BanEntry> {
        bans.iter()
            .map(|(address, reason)| BanEntry {
                address: address.clone(),
                reason: reason.clone(),
            })
            .collect()
    }

    async fn write_snapshot(&self, entries: Vec<BanEntry>) {
        if let Err(e) = self.store.save(&entries).await {
            tracing::error!("Failed to save ban list: {}", e);
        }
    }
}

#[async_trait]
impl BanRepository for InMemoryBanRepository {
    async fn is_banned(&self, addr: &RemoteAddr) -> bool {
        self.bans.lock().await.contains_key(addr)
    }

    async fn ban(&self, addr: RemoteAddr, reason: BanReason) {
        let _persist = self.persist.lock().await;
        let entries = {
            let mut bans = self.bans.lock().await;
            bans.insert(addr, reason);
            Self::to_entries(&bans)
        };
        self.write_snapshot(entries).await;
    }

    async fn unban(&self, addr: &RemoteAddr) -> Option<BanReason> {
        let _persist = self.persist.lock().await;
        let (removed, entries) = {
            let mut bans = self.bans.lock().await;
            let removed = bans.remove(addr);
            (removed, Self::to_entries(&bans))
        };
        if removed.is_some() {
            self.write_snapshot(entries).await;
        }
        removed
    }

    async fn list(&self) -> Vec<BanEntry> {
        Self::to_entries(&*self.bans.lock().await)
    }
}
