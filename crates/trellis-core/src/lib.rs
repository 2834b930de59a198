//! trellis-core
//!
//! Record の正本（store）・キャッシュ（cache）・通知（events）を
//! 1 つの操作として調停するオーケストレーション層。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, record, page, merge, context, errors, events）
//! - **ports**: 抽象化レイヤー（RecordStore, RecordCache, EventSink, Validator, Observer, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, config, service, status）
//! - **impls**: 実装（InMemoryRecordStore など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;
