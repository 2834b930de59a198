//! テスト用のダブル
//!
//! in-memory 実装を包み、フラグで失敗・停止を注入します。

use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::app::{CacheRefresh, RecordService, ServiceBuilder, ServiceConfig};
use crate::domain::{Context, PageRequest, Record, RecordId};
use crate::impls::{InMemoryEventSink, InMemoryRecordCache, InMemoryRecordStore, MemoryObserver};
use crate::ports::{
    CacheError, EventError, EventSink, FixedClock, RecordCache, RecordStore, StoreError,
    UlidGenerator,
};

fn on(flag: &AtomicBool) -> bool {
    flag.load(Ordering::SeqCst)
}

/// 読み取り回数を数え、フラグで書き込みを失敗・停止させる store
#[derive(Default)]
pub(crate) struct SpyStore {
    pub inner: InMemoryRecordStore,
    pub reads: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub hang: AtomicBool,
}

impl SpyStore {
    fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            inner: InMemoryRecordStore::new(clock),
            ..Self::default()
        }
    }

    async fn stall(&self) {
        if on(&self.hang) {
            pending::<()>().await;
        }
    }

    fn write_gate(&self) -> Result<(), StoreError> {
        if on(&self.fail_writes) {
            return Err(StoreError::Backend("write refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SpyStore {
    async fn find_all(&self, ctx: &Context, page: PageRequest) -> Result<Vec<Record>, StoreError> {
        self.stall().await;
        self.inner.find_all(ctx, page).await
    }

    async fn find_by_id(&self, ctx: &Context, id: RecordId) -> Result<Record, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        self.inner.find_by_id(ctx, id).await
    }

    async fn create(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError> {
        self.stall().await;
        self.write_gate()?;
        self.inner.create(ctx, record).await
    }

    async fn update(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError> {
        self.stall().await;
        self.write_gate()?;
        self.inner.update(ctx, record).await
    }

    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), StoreError> {
        self.stall().await;
        self.write_gate()?;
        self.inner.delete_by_id(ctx, id).await
    }
}

/// 呼び出しごとに失敗させられる cache（`set` は停止も可）
#[derive(Default)]
pub(crate) struct FlakyCache {
    pub inner: InMemoryRecordCache,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_delete: AtomicBool,
    pub hang_set: AtomicBool,
    pub gets: AtomicUsize,
}

impl FlakyCache {
    fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            inner: InMemoryRecordCache::new(clock),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordCache for FlakyCache {
    async fn get_by_id(&self, ctx: &Context, id: RecordId) -> Result<Option<Record>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if on(&self.fail_get) {
            return Err(CacheError::Backend("get refused".into()));
        }
        self.inner.get_by_id(ctx, id).await
    }

    async fn set(&self, ctx: &Context, record: &Record, ttl: Duration) -> Result<(), CacheError> {
        if on(&self.hang_set) {
            pending::<()>().await;
        }
        if on(&self.fail_set) {
            return Err(CacheError::Backend("set refused".into()));
        }
        self.inner.set(ctx, record, ttl).await
    }

    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), CacheError> {
        if on(&self.fail_delete) {
            return Err(CacheError::Backend("delete refused".into()));
        }
        self.inner.delete_by_id(ctx, id).await
    }
}

/// イベントごとの失敗スイッチと publish 停止スイッチ付きの sink
pub(crate) struct FlakyEvents {
    pub inner: InMemoryEventSink,
    pub fail_created: AtomicBool,
    pub fail_updated: AtomicBool,
    pub fail_deleted: AtomicBool,
    pub hang_publish: AtomicBool,
}

impl FlakyEvents {
    fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            inner: InMemoryEventSink::new(Arc::new(UlidGenerator::new(clock.clone())), clock),
            fail_created: AtomicBool::new(false),
            fail_updated: AtomicBool::new(false),
            fail_deleted: AtomicBool::new(false),
            hang_publish: AtomicBool::new(false),
        }
    }

    async fn gate(&self, flag: &AtomicBool) -> Result<(), EventError> {
        if on(&self.hang_publish) {
            pending::<()>().await;
        }
        if on(flag) {
            return Err(EventError::Backend("bus unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventSink for FlakyEvents {
    async fn publish_created(&self, ctx: &Context, record: &Record) -> Result<(), EventError> {
        self.gate(&self.fail_created).await?;
        self.inner.publish_created(ctx, record).await
    }

    async fn publish_updated(&self, ctx: &Context, record: &Record) -> Result<(), EventError> {
        self.gate(&self.fail_updated).await?;
        self.inner.publish_updated(ctx, record).await
    }

    async fn publish_deleted(&self, ctx: &Context, id: RecordId) -> Result<(), EventError> {
        self.gate(&self.fail_deleted).await?;
        self.inner.publish_deleted(ctx, id).await
    }
}

/// 組み立て済みのサービスと、全ダブルへのハンドル
pub(crate) struct Harness {
    pub service: RecordService,
    pub store: Arc<SpyStore>,
    pub cache: Arc<FlakyCache>,
    pub events: Arc<FlakyEvents>,
    pub observer: Arc<MemoryObserver>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// 読み取りを決定的にするため cache refresh は Inline
    pub fn new() -> Self {
        Self::with_config(ServiceConfig {
            cache_refresh: CacheRefresh::Inline,
            ..ServiceConfig::default()
        })
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let store = Arc::new(SpyStore::new(clock.clone()));
        let cache = Arc::new(FlakyCache::new(clock.clone()));
        let events = Arc::new(FlakyEvents::new(clock.clone()));
        let observer = Arc::new(MemoryObserver::new());

        let service = ServiceBuilder::new()
            .store(store.clone())
            .cache(cache.clone())
            .events(events.clone())
            .clock(clock.clone())
            .observer(observer.clone())
            .config(config)
            .build()
            .unwrap();

        Self {
            service,
            store,
            cache,
            events,
            observer,
            clock,
        }
    }
}

pub(crate) fn set(flag: &AtomicBool, value: bool) {
    flag.store(value, Ordering::SeqCst);
}

pub(crate) fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
