//! Observer port - 呼び出し側に返さない失敗の受け口
//!
//! cache の失敗と delete 時の publish 失敗は操作を失敗させません。
//! その代わりにここへ報告されます。

use std::fmt;

use crate::domain::{Operation, RecordId};
use crate::ports::{CacheError, EventError};

/// どの cache 呼び出しが失敗したか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCall {
    Get,
    Set,
    Delete,
}

impl fmt::Display for CacheCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheCall::Get => "get",
            CacheCall::Set => "set",
            CacheCall::Delete => "delete",
        })
    }
}

/// Observer は observed-only な失敗を記録する
pub trait Observer: Send + Sync {
    fn cache_failure(&self, op: Operation, call: CacheCall, id: RecordId, error: &CacheError);

    fn event_failure(&self, op: Operation, id: RecordId, error: &EventError);
}

/// 観測した失敗を `tracing` の warn として記録
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn cache_failure(&self, op: Operation, call: CacheCall, id: RecordId, error: &CacheError) {
        tracing::warn!(%op, %call, record_id = %id, %error, "cache failure ignored");
    }

    fn event_failure(&self, op: Operation, id: RecordId, error: &EventError) {
        tracing::warn!(%op, record_id = %id, %error, "event publish failure ignored");
    }
}
