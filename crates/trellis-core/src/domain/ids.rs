//! Domain identifiers (strongly-typed IDs).
//!
//! すべての ID は ULID を包んだ `Id<T>` で表現します。
//! `T` は PhantomData のマーカー型で、RecordId と EventId を
//! コンパイル時に区別するためだけに存在します。
//!
//! ## 表現
//! - Display: `{prefix}{ULID}`（例: `rec-01HZX...`）
//! - FromStr: Display の逆変換（prefix 必須）
//! - serde: Display 文字列として直列化

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display で使うプレフィックス（例: "rec-", "evt-"）
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    /// nil ULID は generator からは払い出されない
    pub fn is_nil(&self) -> bool {
        self.ulid.is_nil()
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// ID 文字列のパース失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    #[error("expected prefix `{expected}` in `{input}`")]
    MissingPrefix { expected: &'static str, input: String },

    #[error("invalid ULID in `{input}`: {reason}")]
    InvalidUlid { input: String, reason: String },
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(raw) = s.strip_prefix(T::prefix()) else {
            return Err(ParseIdError::MissingPrefix {
                expected: T::prefix(),
                input: s.to_string(),
            });
        };
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|e| ParseIdError::InvalidUlid {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Record のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordMarker {}

impl IdMarker for RecordMarker {
    fn prefix() -> &'static str {
        "rec-"
    }
}

/// Event のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventMarker {}

impl IdMarker for EventMarker {
    fn prefix() -> &'static str {
        "evt-"
    }
}

/// Record の識別子（作成時に一度だけ割り当て）
pub type RecordId = Id<RecordMarker>;

/// publish された EventEnvelope の識別子
pub type EventId = Id<EventMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_type_prefix() {
        let ulid = Ulid::new();
        let record = RecordId::from_ulid(ulid);
        let event = EventId::from_ulid(ulid);

        assert_eq!(record.to_string(), format!("rec-{ulid}"));
        assert_eq!(event.to_string(), format!("evt-{ulid}"));
    }

    #[test]
    fn parse_accepts_own_prefix_only() {
        let id = RecordId::from_ulid(Ulid::new());
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        let wrong = format!("evt-{}", id.as_ulid());
        let err = wrong.parse::<RecordId>().unwrap_err();
        assert!(matches!(err, ParseIdError::MissingPrefix { expected: "rec-", .. }));
    }

    #[test]
    fn parse_rejects_garbage_ulid() {
        let err = "rec-not-a-ulid".parse::<RecordId>().unwrap_err();
        assert!(matches!(err, ParseIdError::InvalidUlid { .. }));
    }

    #[test]
    fn serializes_as_display_string() {
        let id = RecordId::from_ulid(Ulid::new());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = RecordId::from_ulid(Ulid::from_parts(1_000, 42));
        let second = RecordId::from_ulid(Ulid::from_parts(2_000, 1));
        assert!(first < second);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<RecordId>(), size_of::<Ulid>());
        assert_eq!(size_of::<EventId>(), 16);
    }
}
