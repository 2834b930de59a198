//! InMemoryRecordStore - 開発・テスト用の正本
//!
//! # 実装詳細
//! - 親行（records）と子行（tags）を別テーブルとして保持
//! - 1 つの Mutex で両方を守るので、delete は子→親を一括で行える
//!   （途中で失敗して子行だけ残る、ということが起きない）
//! - records は BTreeMap なので find_all は識別子順（= 作成順）

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{Context, PageRequest, Record, RecordId};
use crate::ports::{Clock, RecordStore, StoreError, SystemClock};

/// 親行（子コレクションを除いた Record）
#[derive(Debug, Clone)]
struct Row {
    label: String,
    value: i64,
    weight: f64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<RecordId, Row>,
    tags: HashMap<RecordId, Vec<String>>,
}

impl StoreState {
    fn join(&self, id: RecordId, row: &Row) -> Record {
        Record {
            id,
            label: row.label.clone(),
            value: row.value,
            weight: row.weight,
            tags: self.tags.get(&id).cloned().unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn put_tags(&mut self, id: RecordId, tags: &[String]) {
        if tags.is_empty() {
            self.tags.remove(&id);
        } else {
            self.tags.insert(id, tags.to_vec());
        }
    }
}

pub struct InMemoryRecordStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRecordStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `id` に残っている子行の数
    pub async fn child_rows(&self, id: RecordId) -> usize {
        self.state.lock().await.tags.get(&id).map_or(0, Vec::len)
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_all(&self, ctx: &Context, page: PageRequest) -> Result<Vec<Record>, StoreError> {
        ctx.check()?;
        let state = self.state.lock().await;
        let records = state
            .records
            .iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .map(|(id, row)| state.join(*id, row))
            .collect();
        Ok(records)
    }

    async fn find_by_id(&self, ctx: &Context, id: RecordId) -> Result<Record, StoreError> {
        ctx.check()?;
        let state = self.state.lock().await;
        let row = state.records.get(&id).ok_or(StoreError::NotFound(id))?;
        Ok(state.join(id, row))
    }

    async fn create(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError> {
        ctx.check()?;
        let mut state = self.state.lock().await;
        if state.records.contains_key(&record.id) {
            return Err(StoreError::Conflict(record.id));
        }

        let row = Row {
            label: record.label.clone(),
            value: record.value,
            weight: record.weight,
            created_at: self.clock.now(),
            updated_at: None,
        };
        state.put_tags(record.id, &record.tags);
        let stored = state.join(record.id, &row);
        state.records.insert(record.id, row);
        Ok(stored)
    }

    async fn update(&self, ctx: &Context, record: &Record) -> Result<Record, StoreError> {
        ctx.check()?;
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let row = state
            .records
            .get_mut(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;

        row.label = record.label.clone();
        row.value = record.value;
        row.weight = record.weight;
        row.updated_at = Some(now.max(row.created_at));
        let row = row.clone();

        state.put_tags(record.id, &record.tags);
        Ok(state.join(record.id, &row))
    }

    async fn delete_by_id(&self, ctx: &Context, id: RecordId) -> Result<(), StoreError> {
        ctx.check()?;
        let mut state = self.state.lock().await;
        if !state.records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        // children first, parent second, same critical section
        state.tags.remove(&id);
        state.records.remove(&id);
        Ok(())
    }
}
