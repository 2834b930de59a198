//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryRecordStore**: テスト用の正本（子テーブル付き）
//! - **InMemoryRecordCache**: TTL 付きキャッシュ
//! - **InMemoryEventSink** / **NoopEventSink**: イベント送信先
//! - **MemoryObserver**: observed-only な失敗のカウンタ
//!
//! # 本番用実装
//! 本番用の実装（SQL, Redis, メッセージバス）は別クレートに配置します。

pub mod inmem_cache;
pub mod inmem_events;
pub mod inmem_store;
pub mod memory_observer;

// 主要な型を再エクスポート
pub use self::inmem_cache::InMemoryRecordCache;
pub use self::inmem_events::{InMemoryEventSink, NoopEventSink};
pub use self::inmem_store::InMemoryRecordStore;
pub use self::memory_observer::MemoryObserver;
