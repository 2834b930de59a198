//! Events - ドメインイベント
//!
//! EventSink に渡される通知の形です。配送は best-effort で、
//! exactly-once は保証しません。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EventId, RecordId};
use super::record::Record;

/// DomainEvent はドメインで発生したイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    RecordCreated { record: Record },
    RecordUpdated { record: Record },
    RecordDeleted { id: RecordId },
}

impl DomainEvent {
    pub fn record_id(&self) -> RecordId {
        match self {
            DomainEvent::RecordCreated { record } | DomainEvent::RecordUpdated { record } => {
                record.id
            }
            DomainEvent::RecordDeleted { id } => *id,
        }
    }

    /// トピック形式の名前（バス上のルーティング用）
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::RecordCreated { .. } => "record.created",
            DomainEvent::RecordUpdated { .. } => "record.updated",
            DomainEvent::RecordDeleted { .. } => "record.deleted",
        }
    }
}

/// 購読者に渡す、配送メタデータ付きのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}
