//! Merge - 変更の適用方法（全置換 / 疎パッチ）
//!
//! オーケストレータは `UpdateMerger` trait だけを見ます。
//! どちらの variant を受け取ったかは気にしません。
//!
//! - **FullReplace**: すべての可変フィールドを無条件に上書き
//! - **SparsePatch**: `Patch::Present` のフィールドだけを適用し、
//!   `Patch::Absent` は保存済みの値をそのまま残す
//!
//! 識別子とタイムスタンプはどちらの variant でも変更されません。

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::ValidationError;
use super::ids::RecordId;
use super::record::Record;

/// UpdateMerger は「どう変更を適用するか」を表す
pub trait UpdateMerger: Send + Sync {
    /// この変更の対象 Record の識別子
    fn target(&self) -> RecordId;

    /// 保存済みの Record に変更を適用
    fn merge(&self, into: Record) -> Result<Record, ValidationError>;
}

fn ensure_target(target: RecordId, stored: &Record) -> Result<(), ValidationError> {
    if target != stored.id {
        return Err(ValidationError::TargetMismatch {
            target,
            stored: stored.id,
        });
    }
    Ok(())
}

/// 全可変フィールドを指定（保存済みの値は上書き）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullReplace {
    pub id: RecordId,
    pub label: String,
    pub value: i64,
    pub weight: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UpdateMerger for FullReplace {
    fn target(&self) -> RecordId {
        self.id
    }

    fn merge(&self, mut into: Record) -> Result<Record, ValidationError> {
        ensure_target(self.id, &into)?;
        into.label = self.label.clone();
        into.value = self.value;
        into.weight = self.weight;
        into.tags = self.tags.clone();
        Ok(into)
    }
}

/// フィールド値と「指定されたか」の明示フラグ
///
/// decode 時、欠けたフィールドは `Absent`、指定された値は
/// （`Patch<Option<_>>` の `null` も含めて）`Present`。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Patch::Present(v) => Some(v),
            Patch::Absent => None,
        }
    }

    /// 指定されていれば `slot` を上書き
    pub fn apply_to(&self, slot: &mut T)
    where
        T: Clone,
    {
        if let Patch::Present(v) = self {
            *slot = v.clone();
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Absent, Patch::Present)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Present(v) => v.serialize(serializer),
            Patch::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Present)
    }
}

/// 指定されたフィールドだけを適用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsePatch {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub label: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub value: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub weight: Patch<f64>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub tags: Patch<Vec<String>>,
}

impl SparsePatch {
    /// まだ何も変更しないパッチ
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            label: Patch::Absent,
            value: Patch::Absent,
            weight: Patch::Absent,
            tags: Patch::Absent,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Patch::Present(label.into());
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.value = Patch::Present(value);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Patch::Present(weight);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Patch::Present(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_absent()
            && self.value.is_absent()
            && self.weight.is_absent()
            && self.tags.is_absent()
    }
}

impl UpdateMerger for SparsePatch {
    fn target(&self) -> RecordId {
        self.id
    }

    fn merge(&self, mut into: Record) -> Result<Record, ValidationError> {
        ensure_target(self.id, &into)?;
        self.label.apply_to(&mut into.label);
        self.value.apply_to(&mut into.value);
        self.weight.apply_to(&mut into.weight);
        self.tags.apply_to(&mut into.tags);
        Ok(into)
    }
}

/// transport 向けの tagged union
///
/// `{"mode":"replace", ...}` または `{"mode":"patch", ...}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RecordUpdate {
    Replace(FullReplace),
    Patch(SparsePatch),
}

impl UpdateMerger for RecordUpdate {
    fn target(&self) -> RecordId {
        match self {
            RecordUpdate::Replace(r) => r.target(),
            RecordUpdate::Patch(p) => p.target(),
        }
    }

    fn merge(&self, into: Record) -> Result<Record, ValidationError> {
        match self {
            RecordUpdate::Replace(r) => r.merge(into),
            RecordUpdate::Patch(p) => p.merge(into),
        }
    }
}

impl From<FullReplace> for RecordUpdate {
    fn from(value: FullReplace) -> Self {
        RecordUpdate::Replace(value)
    }
}

impl From<SparsePatch> for RecordUpdate {
    fn from(value: SparsePatch) -> Self {
        RecordUpdate::Patch(value)
    }
}
