//! RefreshTracker - バックグラウンドの cache 書き込みを id ごとに追跡
//!
//! # 不変条件
//! - get_by_id が spawn した refresh は、同じ id への update / delete の
//!   cache 書き込みより後に着地してはならない
//! - そのため書き込み側は自分の cache fan-out の前に `settle` を呼び、
//!   保留中の refresh を abort して終了まで待つ
//! - 終了した refresh は自分のエントリを自分で消す（世代番号で識別）

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::domain::RecordId;

type Slots = HashMap<RecordId, Vec<(u64, JoinHandle<()>)>>;

#[derive(Default)]
pub(crate) struct RefreshTracker {
    next_generation: AtomicU64,
    slots: Mutex<Slots>,
}

impl RefreshTracker {
    /// refresh を spawn して id に紐づける
    pub(crate) fn spawn<F>(self: &Arc<Self>, id: RecordId, refresh: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let tracker = Arc::clone(self);

        // 挿入が終わるまで finish() はロックを取れない
        let mut slots = self.lock();
        let handle = tokio::spawn(async move {
            refresh.await;
            tracker.finish(id, generation);
        });
        slots.entry(id).or_default().push((generation, handle));
    }

    /// id の保留中 refresh を全て abort し、終了まで待つ
    pub(crate) async fn settle(&self, id: RecordId) {
        let pending = self.lock().remove(&id).unwrap_or_default();
        for (_, handle) in pending {
            handle.abort();
            // aborted or finished, either way it no longer writes
            let _ = handle.await;
        }
    }

    /// 追跡中の refresh 数
    pub(crate) fn pending(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn finish(&self, id: RecordId, generation: u64) {
        let mut slots = self.lock();
        if let Some(handles) = slots.get_mut(&id) {
            handles.retain(|(g, _)| *g != generation);
            if handles.is_empty() {
                slots.remove(&id);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}
