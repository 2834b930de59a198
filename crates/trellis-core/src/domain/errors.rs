//! Errors - ドメインレベルのエラー型
//!
//! ポート固有のエラー（StoreError など）は各 port モジュールに、
//! オーケストレータが返す ServiceError は `app::error` にあります。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::RecordId;

/// オーケストレータが公開する 5 つの操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ValidationError は呼び出し側の入力誤り
///
/// ページ範囲・フィールド規則・merge 対象の不一致をまとめて扱います。
/// いずれも store に触れる前に検出されます。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("page offset must be >= 0, got {0}")]
    PageOffset(i64),

    #[error("page limit must be within {min}..={max}, got {got}")]
    PageLimit { got: i64, min: u32, max: u32 },

    #[error("field `{field}` {reason}")]
    Field { field: &'static str, reason: String },

    #[error("update targets {target} but the stored record is {stored}")]
    TargetMismatch { target: RecordId, stored: RecordId },

    #[error("record identifier must not be nil")]
    NilIdentifier,
}

impl ValidationError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Field {
            field,
            reason: reason.into(),
        }
    }
}
