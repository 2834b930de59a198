//! InMemoryRecordCache - 開発・テスト用の TTL 付きキャッシュ
//!
//! 期限は注入された Clock で判定します。期限切れのエントリは
//! 読み取り時に miss として扱い、その場で捨てます。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{Context, Record, RecordId};
use crate::ports::{CacheError, Clock, RecordCache, SystemClock};

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    expires_at: DateTime<Utc>,
}

pub struct InMemoryRecordCache {
    entries: Mutex<HashMap<RecordId, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRecordCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// 期限内のエントリ数
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 期限切れの掃除をせずに覗く
    pub async fn peek(&self, id: RecordId) -> Option<Record> {
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        entries
            .get(&id)
            .filter(|e| e.expires_at > now)
            .map(|e| e.record.clone())
    }

    /// 期限切れを全て捨て、捨てた件数を返す
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }
}

impl Default for InMemoryRecordCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl RecordCache for InMemoryRecordCache {
    async fn get_by_id(&self, ctx: &Context, id: RecordId) -> Result<Option<Record>, CacheError> {
        ctx.check()?;
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.get(&id) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.record.clone())),
            Some(_) => {
                entries.remove(&id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, ctx: &Context, record: &Record, ttl: Duration) -> Result<(), CacheError> {
        ctx.check()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Backend(format!("ttl out of range: {e}")))?;
        let expires_at = self.clock.now() + ttl;
        self.entries.lock().await.insert(
            record.id,
            Entry {
                record: record.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), CacheError> {
        ctx.check()?;
        self.entries.lock().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewRecord;
    use crate::ports::FixedClock;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn setup() -> (Arc<FixedClock>, InMemoryRecordCache, Record) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let cache = InMemoryRecordCache::new(clock.clone());
        let record = Record::new(
            RecordId::from_ulid(Ulid::new()),
            NewRecord::new("cached", 1, 1.0),
            start,
        );
        (clock, cache, record)
    }

    #[tokio::test]
    async fn set_then_get_hits() {
        let (_clock, cache, record) = setup();
        let ctx = Context::background();

        assert_eq!(cache.get_by_id(&ctx, record.id).await.unwrap(), None);
        cache.set(&ctx, &record, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get_by_id(&ctx, record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss_and_is_evicted() {
        let (clock, cache, record) = setup();
        let ctx = Context::background();
        cache.set(&ctx, &record, Duration::from_secs(60)).await.unwrap();

        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(cache.get_by_id(&ctx, record.id).await.unwrap(), None);
        assert_eq!(cache.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let (clock, cache, record) = setup();
        let ctx = Context::background();
        let other = Record {
            id: RecordId::from_ulid(Ulid::new()),
            ..record.clone()
        };
        cache.set(&ctx, &record, Duration::from_secs(10)).await.unwrap();
        cache.set(&ctx, &other, Duration::from_secs(100)).await.unwrap();

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.peek(other.id).await, Some(other));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (_clock, cache, record) = setup();
        let ctx = Context::background();
        cache.set(&ctx, &record, Duration::from_secs(60)).await.unwrap();

        cache.delete_by_id(&ctx, record.id).await.unwrap();
        assert!(cache.is_empty().await);
        // deleting a missing key is not an error
        cache.delete_by_id(&ctx, record.id).await.unwrap();
    }
}
