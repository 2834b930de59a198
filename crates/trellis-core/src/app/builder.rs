//! ServiceBuilder - RecordService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - store / cache / events の 3 ポートは必須
//! - build() 時に不足しているポートをまとめて BuildError で返す
//! - validator / clock / ids / observer は省略時に既定の実装を使う

use std::sync::Arc;

use crate::app::config::ServiceConfig;
use crate::app::service::RecordService;
use crate::ports::{
    Clock, EventSink, FieldValidator, IdGenerator, Observer, RecordCache, RecordStore,
    SystemClock, TracingObserver, UlidGenerator, Validator,
};

/// ServiceBuilder は RecordService を構築
///
/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new()
///     .store(Arc::new(InMemoryRecordStore::default()))
///     .cache(Arc::new(InMemoryRecordCache::default()))
///     .events(Arc::new(InMemoryEventSink::default()))
///     .config(ServiceConfig::from_env()?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ServiceBuilder {
    store: Option<Arc<dyn RecordStore>>,
    cache: Option<Arc<dyn RecordCache>>,
    events: Option<Arc<dyn EventSink>>,
    validator: Option<Arc<dyn Validator>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    observer: Option<Arc<dyn Observer>>,
    config: ServiceConfig,
}

/// BuildError はサービス構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These ports are required but were not provided.")]
    MissingPorts(Vec<&'static str>),
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// 作成時刻と（`ids` 未指定なら）ULID の timestamp に使う Clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// # 検証
    /// - store / cache / events が揃っているかチェック
    /// - 不足があれば BuildError::MissingPorts を返す（宣言順）
    pub fn build(self) -> Result<RecordService, BuildError> {
        let missing: Vec<&'static str> = [
            ("store", self.store.is_none()),
            ("cache", self.cache.is_none()),
            ("events", self.events.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(store), Some(cache), Some(events)) = (self.store, self.cache, self.events)
        else {
            return Err(BuildError::MissingPorts(missing));
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));

        Ok(RecordService::new(
            store,
            cache,
            events,
            self.validator
                .unwrap_or_else(|| Arc::new(FieldValidator::default())),
            clock,
            ids,
            self.observer.unwrap_or_else(|| Arc::new(TracingObserver)),
            self.config,
        ))
    }
}
