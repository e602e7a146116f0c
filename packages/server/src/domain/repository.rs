//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! どの実装も、各操作は他のセッション・管理コンソールからの同時操作に対して
//! アトミックでなければならない（部分的に更新されたエントリは観測されない）。

use async_trait::async_trait;

use super::{
    BanEntry, BanReason, ConnectionId, DisplayName, PersistenceError, RemoteAddr,
    RepositoryError, Session, Timestamp,
};

/// Session Repository trait（接続レジストリ）
///
/// 接続 ID からセッション状態への唯一の正規マッピング。
/// 切断処理で使う変更操作は `remove`（存在すれば削除）のみで、
/// 同時に発生した切断トリガーのうち 1 つだけが `Some` を受け取る。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// セッションを登録
    async fn add(&self, session: Session) -> Result<(), RepositoryError>;

    /// セッションが存在すれば削除して返す
    async fn remove(&self, id: &ConnectionId) -> Option<Session>;

    /// セッションを取得
    async fn get(&self, id: &ConnectionId) -> Option<Session>;

    /// 表示名を変更し、変更前の名前を返す
    ///
    /// 名前のバリデーションは `DisplayName` の生成時に済んでいる。
    async fn rename(
        &self,
        id: &ConnectionId,
        new_name: DisplayName,
    ) -> Result<DisplayName, RepositoryError>;

    /// 最終アクティビティ時刻を更新
    async fn touch(&self, id: &ConnectionId, at: Timestamp) -> Result<(), RepositoryError>;

    /// 全てのセッションを接続順に取得
    async fn all(&self) -> Vec<Session>;

    /// 接続中の全てのクライアント ID を取得
    async fn all_ids(&self) -> Vec<ConnectionId>;

    /// 接続中のセッション数を取得
    async fn count(&self) -> usize;

    /// 表示名で検索（大文字小文字を区別しない、最も早く接続したものが一致）
    async fn find_by_name(&self, name: &str) -> Option<Session>;

    /// 指定アドレスから接続している全てのセッションを取得
    async fn find_by_address(&self, addr: &RemoteAddr) -> Vec<Session>;
}

/// Ban Repository trait（ban レジストリ）
///
/// 変更のたびに永続化スナップショットを書き出す。書き出しの失敗は
/// ログに記録され、メモリ上の変更はそのまま有効になる。
#[async_trait]
pub trait BanRepository: Send + Sync {
    /// アドレスが ban されているか
    async fn is_banned(&self, addr: &RemoteAddr) -> bool;

    /// ban を追加（既存のエントリは理由を上書き）
    async fn ban(&self, addr: RemoteAddr, reason: BanReason);

    /// ban を解除し、解除前の理由を返す（エントリが無ければ `None`）
    async fn unban(&self, addr: &RemoteAddr) -> Option<BanReason>;

    /// 全ての ban エントリをアドレス順に取得
    async fn list(&self) -> Vec<BanEntry>;
}

/// ban リストの永続化先
#[async_trait]
pub trait BanSnapshotStore: Send + Sync {
    /// スナップショットを読み込む
    ///
    /// ファイルが無い・読めない場合は空のリストを返し、プロセスを落とさない。
    async fn load(&self) -> Vec<BanEntry>;

    /// スナップショットを書き出す
    async fn save(&self, entries: &[BanEntry]) -> Result<(), PersistenceError>;
}
