//! MemoryObserver - observed-only な失敗をカウントする Observer
//!
//! 各失敗は tracing にも流します（TracingObserver と同じ出力）。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::FailureCounts;
use crate::domain::{Operation, RecordId};
use crate::ports::{CacheCall, CacheError, EventError, Observer, TracingObserver};

#[derive(Debug, Default)]
pub struct MemoryObserver {
    cache_get: AtomicU64,
    cache_set: AtomicU64,
    cache_delete: AtomicU64,
    event_publish: AtomicU64,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> FailureCounts {
        FailureCounts {
            cache_get: self.cache_get.load(Ordering::Relaxed),
            cache_set: self.cache_set.load(Ordering::Relaxed),
            cache_delete: self.cache_delete.load(Ordering::Relaxed),
            event_publish: self.event_publish.load(Ordering::Relaxed),
        }
    }
}

impl Observer for MemoryObserver {
    fn cache_failure(&self, op: Operation, call: CacheCall, id: RecordId, error: &CacheError) {
        let counter = match call {
            CacheCall::Get => &self.cache_get,
            CacheCall::Set => &self.cache_set,
            CacheCall::Delete => &self.cache_delete,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        TracingObserver.cache_failure(op, call, id, error);
    }

    fn event_failure(&self, op: Operation, id: RecordId, error: &EventError) {
        self.event_publish.fetch_add(1, Ordering::Relaxed);
        TracingObserver.event_failure(op, id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn counts_each_call_separately() {
        let observer = MemoryObserver::new();
        let id = RecordId::from_ulid(Ulid::new());
        let err = CacheError::Backend("down".into());

        observer.cache_failure(Operation::Get, CacheCall::Get, id, &err);
        observer.cache_failure(Operation::Create, CacheCall::Set, id, &err);
        observer.cache_failure(Operation::Update, CacheCall::Set, id, &err);
        observer.event_failure(Operation::Delete, id, &EventError::Backend("bus".into()));

        let counts = observer.counts();
        assert_eq!(
            counts,
            FailureCounts {
                cache_get: 1,
                cache_set: 2,
                cache_delete: 0,
                event_publish: 1,
            }
        );
        assert_eq!(counts.total(), 4);
        assert!(!counts.is_clean());
    }
}
