//! EventSink port - 作成・更新・削除の通知
//!
//! # 失敗の扱い（オーケストレータ側）
//! - created / updated の publish 失敗: 呼び出し側に PropagationFailure として返す
//! - deleted の publish 失敗: 観測のみ（削除自体は完了している）

use async_trait::async_trait;

use crate::domain::{Context, Interrupted, Record, RecordId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("event bus error: {0}")]
    Backend(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// EventSink はドメインイベントを fire-and-forget で送る
#[async_trait]
pub trait EventSink: Send + Sync {
    /// 作成の通知（失敗は呼び出し側に返る）
    async fn publish_created(&self, ctx: &Context, record: &Record) -> Result<(), EventError>;

    /// 更新の通知（失敗は呼び出し側に返る）
    async fn publish_updated(&self, ctx: &Context, record: &Record) -> Result<(), EventError>;

    /// 削除の通知（失敗は観測のみ）
    async fn publish_deleted(&self, ctx: &Context, id: RecordId) -> Result<(), EventError>;
}
