//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ServiceBuilder**: ポートのワイヤリングと起動時検証
//! - **RecordService**: list / get / create / update / delete のオーケストレーション
//! - **ServiceConfig**: 環境変数からの設定
//! - **ServiceError**: 呼び出し側に返るエラー分類

pub mod builder;
pub mod config;
pub mod error;
pub mod service;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ServiceBuilder};
pub use self::config::{CacheRefresh, ConfigError, ServiceConfig};
pub use self::error::{ErrorKind, ServiceError};
pub use self::service::RecordService;
pub use self::status::FailureCounts;
