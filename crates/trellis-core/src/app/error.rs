//! ServiceError - オーケストレータが返すエラー分類
//!
//! | variant            | 意味                                   | transport |
//! |--------------------|----------------------------------------|-----------|
//! | NotFound           | store に識別子が存在しない             | 404       |
//! | ValidationFailed   | 入力・merge 結果が規則に反する         | 400       |
//! | StoreFailure       | store の一時的/恒久的な障害            | 500       |
//! | PropagationFailure | 書き込みは成功、通知が失敗             | 500       |
//! | Cancelled          | キャンセル / 期限切れ                  | 499       |
//!
//! CacheFailure はここには現れません（Observer に報告されるだけ）。

use crate::domain::{Interrupted, Operation, RecordId, ValidationError};
use crate::ports::{EventError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("store failure during {op}: {source}")]
    StoreFailure {
        op: Operation,
        #[source]
        source: StoreError,
    },

    /// store への書き込みは確定済み。通知だけが欠けている
    #[error("record {id} was written but {op} notification failed: {source}")]
    PropagationFailure {
        op: Operation,
        id: RecordId,
        #[source]
        source: EventError,
    },

    #[error(transparent)]
    Cancelled(Interrupted),
}

/// transport アダプタ向けの粗い分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Internal,
    Cancelled,
}

impl ErrorKind {
    /// HTTP 相当のステータスコード
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
            ErrorKind::Cancelled => 499,
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::ValidationFailed(_) => ErrorKind::InvalidInput,
            ServiceError::StoreFailure { .. } | ServiceError::PropagationFailure { .. } => {
                ErrorKind::Internal
            }
            ServiceError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// 呼び出しは失敗したが store には変更が残っている場合に true
    pub fn is_committed(&self) -> bool {
        matches!(self, ServiceError::PropagationFailure { .. })
    }

    /// store のエラーを分類（キャンセルはドメインエラーに包まない）
    pub(crate) fn from_store(op: Operation, error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            StoreError::Interrupted(i) => ServiceError::Cancelled(i),
            source => ServiceError::StoreFailure { op, source },
        }
    }

    pub(crate) fn from_publish(op: Operation, id: RecordId, error: EventError) -> Self {
        match error {
            EventError::Interrupted(i) => ServiceError::Cancelled(i),
            source => ServiceError::PropagationFailure { op, id, source },
        }
    }
}

impl From<Interrupted> for ServiceError {
    fn from(value: Interrupted) -> Self {
        ServiceError::Cancelled(value)
    }
}
