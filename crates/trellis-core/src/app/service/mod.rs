//! RecordService - store / cache / events を束ねるオーケストレータ
//!
//! # 失敗ポリシー
//! | 操作        | store 失敗 | cache 失敗 | publish 失敗         |
//! |-------------|------------|------------|----------------------|
//! | list        | 返す       | -          | -                    |
//! | get_by_id   | 返す       | 観測のみ   | -                    |
//! | create      | 返す       | 観測のみ   | PropagationFailure   |
//! | update      | 返す       | 観測のみ   | PropagationFailure   |
//! | delete_by_id| 返す       | 観測のみ   | 観測のみ             |
//!
//! 書き込み後の cache 書き込みと publish は `tokio::join!` で並行に走り、
//! 両方が終わるまで待ちます。どちらかの失敗がもう一方を止めることはありません。
//!
//! 全てのポート呼び出しは `Context::guard` の中で行われるので、
//! キャンセルと期限切れは進行中の呼び出しを中断して Cancelled になります。
//!
//! get_by_id のバックグラウンド refresh は RefreshTracker で id ごとに追跡し、
//! update / delete は自分の cache fan-out の前にそれを片付けます。
//! 古い Record が後から cache に着地することはありません。

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;

use crate::app::config::{CacheRefresh, ServiceConfig};
use crate::app::error::ServiceError;
use crate::domain::{
    Context, Interrupted, NewRecord, Operation, PageRequest, Record, RecordId, UpdateMerger,
    ValidationError,
};
use crate::ports::{
    CacheCall, CacheError, Clock, EventSink, IdGenerator, Observer, RecordCache, RecordStore,
    Validator,
};

mod refresh;

use self::refresh::RefreshTracker;

/// Context の下でポート呼び出しを実行し、中断をポートのエラーに畳み込む
async fn guarded<T, E, F>(ctx: &Context, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Interrupted>,
{
    ctx.guard(fut).await.map_err(E::from).and_then(|out| out)
}

/// RecordService は Record の CRUD をポート越しに調停する
///
/// 全フィールドが `Arc` なので clone は安価です（バックグラウンドの
/// cache 書き込みはこの clone を持って spawn されます）。
/// clone 同士は同じ RefreshTracker を共有します。
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn RecordCache>,
    events: Arc<dyn EventSink>,
    validator: Arc<dyn Validator>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    observer: Arc<dyn Observer>,
    config: ServiceConfig,
    refreshes: Arc<RefreshTracker>,
}

impl RecordService {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn RecordCache>,
        events: Arc<dyn EventSink>,
        validator: Arc<dyn Validator>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        observer: Arc<dyn Observer>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            events,
            validator,
            clock,
            ids,
            observer,
            config,
            refreshes: Arc::new(RefreshTracker::default()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// 期限の無い Context に default_timeout を適用
    fn scoped(&self, ctx: &Context) -> Context {
        match (ctx.deadline(), self.config.default_timeout) {
            (None, Some(timeout)) => ctx.with_timeout(timeout),
            _ => ctx.clone(),
        }
    }

    /// store から 1 ページ分を取得（cache は見ない）
    pub async fn list(&self, ctx: &Context, page: PageRequest) -> Result<Vec<Record>, ServiceError> {
        let ctx = self.scoped(ctx);
        let span = tracing::debug_span!(
            parent: ctx.span(),
            "record.list",
            offset = page.offset(),
            limit = page.limit()
        );

        async {
            let records = guarded(&ctx, self.store.find_all(&ctx, page))
                .await
                .map_err(|e| ServiceError::from_store(Operation::List, e))?;
            tracing::debug!(count = records.len(), "listed records");
            Ok(records)
        }
        .instrument(span)
        .await
    }

    /// Cache-aside 読み取り
    ///
    /// - cache のエラーは miss として扱う
    /// - store のエラー（NotFound を含む）はそのまま返す
    /// - store から読めたら `ServiceConfig::cache_refresh` に従って cache を埋め直す
    ///   （この書き込みが読み取りを失敗させることはない）
    pub async fn get_by_id(&self, ctx: &Context, id: RecordId) -> Result<Record, ServiceError> {
        let ctx = self.scoped(ctx);
        let span = tracing::debug_span!(parent: ctx.span(), "record.get", record_id = %id);

        async {
            match guarded(&ctx, self.cache.get_by_id(&ctx, id)).await {
                Ok(Some(record)) => {
                    tracing::debug!("cache hit");
                    return Ok(record);
                }
                Ok(None) => tracing::debug!("cache miss"),
                Err(CacheError::Interrupted(i)) => return Err(i.into()),
                Err(e) => {
                    self.observer
                        .cache_failure(Operation::Get, CacheCall::Get, id, &e);
                }
            }

            let record = guarded(&ctx, self.store.find_by_id(&ctx, id))
                .await
                .map_err(|e| ServiceError::from_store(Operation::Get, e))?;
            self.refresh_cache(&ctx, &record).await;
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// 新しい識別子で Record を作成
    ///
    /// `PropagationFailure` の時点で Record は保存・cache 済みです。
    pub async fn create(&self, ctx: &Context, input: NewRecord) -> Result<Record, ServiceError> {
        let ctx = self.scoped(ctx);
        let id = self.ids.generate_record_id();
        let span = tracing::info_span!(parent: ctx.span(), "record.create", record_id = %id);

        async {
            let candidate = Record::new(id, input, self.clock.now());
            self.validator.validate(&candidate)?;

            let record = guarded(&ctx, self.store.create(&ctx, &candidate))
                .await
                .map_err(|e| ServiceError::from_store(Operation::Create, e))?;

            let ((), published) = tokio::join!(
                self.cache_set(&ctx, Operation::Create, &record),
                guarded(&ctx, self.events.publish_created(&ctx, &record)),
            );
            published.map_err(|e| ServiceError::from_publish(Operation::Create, id, e))?;

            tracing::info!("record created");
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Read-merge-write で更新
    ///
    /// 保存済みの Record を読み、`merger` に渡し、検証して書き戻します。
    /// 同じ Record への並行 update は last-write-wins です。
    pub async fn update<M>(
        &self,
        ctx: &Context,
        id: RecordId,
        merger: &M,
    ) -> Result<Record, ServiceError>
    where
        M: UpdateMerger + ?Sized,
    {
        let ctx = self.scoped(ctx);
        let span = tracing::info_span!(parent: ctx.span(), "record.update", record_id = %id);

        async {
            if merger.target() != id {
                return Err(ValidationError::TargetMismatch {
                    target: merger.target(),
                    stored: id,
                }
                .into());
            }

            let stored = guarded(&ctx, self.store.find_by_id(&ctx, id))
                .await
                .map_err(|e| ServiceError::from_store(Operation::Update, e))?;

            let merged = merger.merge(stored)?;
            if merged.id != id {
                return Err(ValidationError::TargetMismatch {
                    target: merged.id,
                    stored: id,
                }
                .into());
            }
            self.validator.validate(&merged)?;

            let record = guarded(&ctx, self.store.update(&ctx, &merged))
                .await
                .map_err(|e| ServiceError::from_store(Operation::Update, e))?;
            self.refreshes.settle(id).await;

            let ((), published) = tokio::join!(
                self.cache_set(&ctx, Operation::Update, &record),
                guarded(&ctx, self.events.publish_updated(&ctx, &record)),
            );
            published.map_err(|e| ServiceError::from_publish(Operation::Update, id, e))?;

            tracing::info!("record updated");
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Record を削除
    ///
    /// store の削除が成功すれば呼び出しは成功です。
    /// cache の削除と deleted イベントの失敗は観測のみ。
    pub async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), ServiceError> {
        let ctx = self.scoped(ctx);
        let span = tracing::info_span!(parent: ctx.span(), "record.delete", record_id = %id);

        async {
            guarded(&ctx, self.store.delete_by_id(&ctx, id))
                .await
                .map_err(|e| ServiceError::from_store(Operation::Delete, e))?;
            self.refreshes.settle(id).await;

            let (evicted, published) = tokio::join!(
                guarded(&ctx, self.cache.delete_by_id(&ctx, id)),
                guarded(&ctx, self.events.publish_deleted(&ctx, id)),
            );
            if let Err(e) = evicted {
                self.observer
                    .cache_failure(Operation::Delete, CacheCall::Delete, id, &e);
            }
            if let Err(e) = published {
                self.observer.event_failure(Operation::Delete, id, &e);
            }

            tracing::info!("record deleted");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn cache_set(&self, ctx: &Context, op: Operation, record: &Record) {
        let result = guarded(ctx, self.cache.set(ctx, record, self.config.cache_ttl)).await;
        if let Err(e) = result {
            self.observer.cache_failure(op, CacheCall::Set, record.id, &e);
        }
    }

    async fn refresh_cache(&self, ctx: &Context, record: &Record) {
        match self.config.cache_refresh {
            CacheRefresh::Inline => self.cache_set(ctx, Operation::Get, record).await,
            CacheRefresh::Background => {
                let service = self.clone();
                let ctx = ctx.with_timeout(self.config.refresh_timeout);
                let record = record.clone();
                self.refreshes.spawn(
                    record.id,
                    async move { service.cache_set(&ctx, Operation::Get, &record).await }
                        .in_current_span(),
                );
            }
        }
    }
}
