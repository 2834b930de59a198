//! InMemoryEventSink - 開発・テスト用のイベント送信先
//!
//! publish された EventEnvelope をログに積み、同時に broadcast で
//! 購読者へ流します。購読者がいなくても publish は成功します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use crate::domain::{Context, DomainEvent, EventEnvelope, Record, RecordId};
use crate::ports::{Clock, EventError, EventSink, IdGenerator, SystemClock, UlidGenerator};

const CHANNEL_CAPACITY: usize = 256;

pub struct InMemoryEventSink {
    log: Mutex<Vec<EventEnvelope>>,
    tx: broadcast::Sender<EventEnvelope>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEventSink {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            log: Mutex::new(Vec::new()),
            tx,
            ids,
            clock,
        }
    }

    /// この呼び出し以降に publish される envelope の購読
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// これまでに publish された全件（古い順）
    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.log.lock().await.clone()
    }

    pub async fn published_for(&self, id: RecordId) -> Vec<DomainEvent> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|env| env.event.record_id() == id)
            .map(|env| env.event.clone())
            .collect()
    }

    async fn emit(&self, ctx: &Context, event: DomainEvent) -> Result<(), EventError> {
        ctx.check()?;
        let envelope = EventEnvelope {
            event_id: self.ids.generate_event_id(),
            occurred_at: self.clock.now(),
            event,
        };
        tracing::debug!(
            event_id = %envelope.event_id,
            event = envelope.event.name(),
            record_id = %envelope.event.record_id(),
            "event published"
        );
        self.log.lock().await.push(envelope.clone());
        // no receivers is fine
        let _ = self.tx.send(envelope);
        Ok(())
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new(Arc::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn publish_created(&self, ctx: &Context, record: &Record) -> Result<(), EventError> {
        self.emit(
            ctx,
            DomainEvent::RecordCreated {
                record: record.clone(),
            },
        )
        .await
    }

    async fn publish_updated(&self, ctx: &Context, record: &Record) -> Result<(), EventError> {
        self.emit(
            ctx,
            DomainEvent::RecordUpdated {
                record: record.clone(),
            },
        )
        .await
    }

    async fn publish_deleted(&self, ctx: &Context, id: RecordId) -> Result<(), EventError> {
        self.emit(ctx, DomainEvent::RecordDeleted { id }).await
    }
}

/// 全イベントを捨てる（バスの無い構成向け）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish_created(&self, ctx: &Context, _record: &Record) -> Result<(), EventError> {
        Ok(ctx.check()?)
    }

    async fn publish_updated(&self, ctx: &Context, _record: &Record) -> Result<(), EventError> {
        Ok(ctx.check()?)
    }

    async fn publish_deleted(&self, ctx: &Context, _id: RecordId) -> Result<(), EventError> {
        Ok(ctx.check()?)
    }
}
