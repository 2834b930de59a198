//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（SQL, Redis, メッセージバスなど）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - RecordStore が source of truth（正本）
//! - RecordCache は使い捨ての射影（TTL 付き）
//! - EventSink は best-effort の通知
//! - ports はオーケストレータ（app）の型を import しない

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod observer;
pub mod record_cache;
pub mod record_store;
pub mod validator;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventError, EventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::observer::{CacheCall, Observer, TracingObserver};
pub use self::record_cache::{CacheError, RecordCache};
pub use self::record_store::{RecordStore, StoreError};
pub use self::validator::{FieldValidator, Validator};
