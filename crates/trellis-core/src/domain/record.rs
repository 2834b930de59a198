//! Record - オーケストレータが扱うエンティティ
//!
//! store が正本、cache はいつでも作り直せる射影、
//! event は派生した観測ストリームです。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RecordId;

/// 作成入力（可変フィールドのみ。識別子とタイムスタンプは持たない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub label: String,
    pub value: i64,
    pub weight: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewRecord {
    pub fn new(label: impl Into<String>, value: i64, weight: f64) -> Self {
        Self {
            label: label.into(),
            value,
            weight,
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// 保存された Record
///
/// # 不変条件
/// - `id` は作成後 nil にならず、付け替えられない
/// - `updated_at` がある場合は `created_at <= updated_at`
/// - 最初の update が成功するまで `updated_at` は `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub label: String,
    pub value: i64,
    pub weight: f64,

    /// 子行（store は親とは別に保存する）
    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// 作成入力から候補の Record を組み立てる
    pub fn new(id: RecordId, input: NewRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: input.label,
            value: input.value,
            weight: input.weight,
            tags: input.tags,
            created_at,
            updated_at: None,
        }
    }

    /// 更新時刻を打刻（作成時刻より前にはしない）
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now.max(self.created_at));
    }

    /// 作成・更新時刻のうち新しい方
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}
