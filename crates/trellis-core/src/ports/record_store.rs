//! RecordStore port - 正本（source of truth）
//!
//! 実装（SQL など）はこのクレートの外にあります。
//! InMemoryRecordStore は `impls` にある開発・テスト用の実装です。

use async_trait::async_trait;

use crate::domain::{Context, Interrupted, PageRequest, Record, RecordId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// 識別子が存在しない（呼び出し側で特別扱いすること）
    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("record {0} already exists")]
    Conflict(RecordId),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// RecordStore は Record の永続化
///
/// # 設計原則
/// - 接続・プールの管理は実装側の責務
/// - `create` は `created_at` を、`update` は `updated_at` を打刻し、
///   永続化された Record を返す
/// - `delete_by_id` は子コレクション（tags）と親を一括で削除する
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 識別子順にページング（空のページも成功）
    async fn find_all(&self, ctx: &Context, page: PageRequest) -> Result<Vec<Record>, StoreError>;

    /// 1 件取得（無ければ `StoreError::NotFound`）
    async fn find_by_id(&self, ctx: &Context, id: RecordId) -> Result<Record, StoreError>;

    /// 新規作成（同じ識別子が既にあれば `StoreError::Conflict`）
    async fn create(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError>;

    /// 全可変フィールドと子コレクションを書き換える
    async fn update(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError>;

    /// 子行と親行を一括で削除
    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), StoreError>;
}
