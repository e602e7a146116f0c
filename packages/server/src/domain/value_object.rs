//! Value Objects
//!
//! 不変で、値によって等価性が決まるドメインの基本型。
//! 生成時にバリデーションを行い、不正な値を型レベルで排除します。

use std::{fmt, net::IpAddr};

use serde::Serialize;
use uuid::Uuid;

use room21_shared::time::timestamp_to_rfc3339;

use super::error::ValidationError;

/// Opaque identity of one live connection.
///
/// Generated from a v4 UUID, so it is never reused within the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい ConnectionId を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 短縮表記（ログ・管理コンソール用）
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable name shown next to chat messages.
///
/// 1–20 characters from `[a-zA-Z0-9_-]`. Uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// 表示名の最大文字数
    pub const MAX_LEN: usize = 20;

    /// 新しい DisplayName を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let valid = !value.is_empty()
            && value.chars().count() <= Self::MAX_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidDisplayName(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 大文字小文字を区別せずに比較（管理コマンドの名前解決用）
    pub fn matches_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote address of a connection, as used for ban checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RemoteAddr(String);

impl RemoteAddr {
    /// 新しい RemoteAddr を作成（前後の空白は除去）
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidAddress(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `value` looks like an IPv4 dotted quad (`\d{1,3}(\.\d{1,3}){3}`).
    ///
    /// Ban targets in this shape are treated as addresses; anything else is a
    /// display-name lookup.
    pub fn is_dotted_quad(value: &str) -> bool {
        let parts: Vec<&str> = value.split('.').collect();
        parts.len() == 4
            && parts
                .iter()
                .all(|p| (1..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit()))
    }
}

impl From<IpAddr> for RemoteAddr {
    fn from(ip: IpAddr) -> Self {
        // IPv4-mapped IPv6 (::ffff:a.b.c.d) is stored in its IPv4 form
        Self(ip.to_canonical().to_string())
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text reason attached to a ban entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanReason(String);

impl BanReason {
    pub const DEFAULT: &'static str = "No reason provided";

    /// 空の理由はデフォルト文言に置き換える
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::default()
        } else {
            Self(value.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BanReason {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitized chat text, ready to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent(String);

impl MessageContent {
    /// デフォルトの最大文字数
    pub const MAX_LEN: usize = 500;

    /// 生のテキストを HTML エスケープ・トリムし、長さを検証する
    ///
    /// `&`, `<`, `>` をこの順にエスケープしてから前後の空白を除去する。
    /// 文字数はエスケープ後の文字列で数える。
    pub fn sanitize(raw: &str, max_len: usize) -> Result<Self, ValidationError> {
        let escaped = raw
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        let sanitized = escaped.trim();

        if sanitized.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if sanitized.chars().count() > max_len {
            return Err(ValidationError::MessageTooLong { max: max_len });
        }

        Ok(Self(sanitized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        timestamp_to_rfc3339(self.0)
    }
}
