//! RecordCache port - read-through キャッシュ（Redis など）
//!
//! キャッシュは助言的なものです。ここで起きたエラーは観測されるだけで、
//! オーケストレータの操作を失敗させることはありません。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Context, Interrupted, Record, RecordId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// RecordCache は Record の使い捨て射影
///
/// # 設計原則
/// - miss は `Ok(None)`、障害は `Err`（読み取り側ではどちらも「値なし」）
/// - TTL 経過後のエントリは miss として扱う
#[async_trait]
pub trait RecordCache: Send + Sync {
    async fn get_by_id(&self, ctx: &Context, id: RecordId) -> Result<Option<Record>, CacheError>;

    async fn set(&self, ctx: &Context, record: &Record, ttl: Duration) -> Result<(), CacheError>;

    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), CacheError>;
}
