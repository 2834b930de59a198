//! Validator port - Record の構造・範囲チェック
//!
//! ルールの中身は差し替え可能です。FieldValidator はデフォルト実装。

use crate::domain::{Record, ValidationError};

/// Validator は store に書く前の Record を検査する
///
/// # 設計原則
/// - 純粋関数（I/O なし）
/// - 最初に見つかった違反を返す
pub trait Validator: Send + Sync {
    fn validate(&self, record: &Record) -> Result<(), ValidationError>;
}

/// デフォルトのフィールド規則
#[derive(Debug, Clone)]
pub struct FieldValidator {
    pub max_label_len: usize,
    pub max_tags: usize,
    pub max_tag_len: usize,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self {
            max_label_len: 255,
            max_tags: 32,
            max_tag_len: 64,
        }
    }
}

impl Validator for FieldValidator {
    fn validate(&self, record: &Record) -> Result<(), ValidationError> {
        if record.id.is_nil() {
            return Err(ValidationError::NilIdentifier);
        }

        if record.label.trim().is_empty() {
            return Err(ValidationError::field("label", "must not be blank"));
        }
        let label_len = record.label.chars().count();
        if label_len > self.max_label_len {
            return Err(ValidationError::field(
                "label",
                format!("is {label_len} chars, max {}", self.max_label_len),
            ));
        }

        if !record.weight.is_finite() {
            return Err(ValidationError::field("weight", "must be finite"));
        }
        if record.weight < 0.0 {
            return Err(ValidationError::field("weight", "must be >= 0"));
        }

        if record.tags.len() > self.max_tags {
            return Err(ValidationError::field(
                "tags",
                format!("has {} entries, max {}", record.tags.len(), self.max_tags),
            ));
        }
        for tag in &record.tags {
            if tag.trim().is_empty() {
                return Err(ValidationError::field("tags", "must not contain blank tags"));
            }
            if tag.chars().count() > self.max_tag_len {
                return Err(ValidationError::field(
                    "tags",
                    format!("tag `{tag}` exceeds {} chars", self.max_tag_len),
                ));
            }
        }

        if let Some(updated_at) = record.updated_at
            && updated_at < record.created_at
        {
            return Err(ValidationError::field(
                "updated_at",
                "must not precede created_at",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewRecord, RecordId};
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use ulid::Ulid;

    fn record(input: NewRecord) -> Record {
        Record::new(RecordId::from_ulid(Ulid::new()), input, Utc::now())
    }

    #[test]
    fn accepts_reasonable_record() {
        let r = record(NewRecord::new("foo_create", 1, 1.5).with_tags(["a", "b"]));
        assert_eq!(FieldValidator::default().validate(&r), Ok(()));
    }

    #[rstest]
    #[case::blank_label(NewRecord::new("   ", 1, 1.0), "label")]
    #[case::long_label(NewRecord::new("x".repeat(256), 1, 1.0), "label")]
    #[case::nan_weight(NewRecord::new("a", 1, f64::NAN), "weight")]
    #[case::negative_weight(NewRecord::new("a", 1, -0.5), "weight")]
    #[case::blank_tag(NewRecord::new("a", 1, 1.0).with_tags([""]), "tags")]
    #[case::long_tag(NewRecord::new("a", 1, 1.0).with_tags(["t".repeat(65)]), "tags")]
    fn rejects_bad_field(#[case] input: NewRecord, #[case] expected: &str) {
        let err = FieldValidator::default().validate(&record(input)).unwrap_err();
        assert!(matches!(err, ValidationError::Field { field, .. } if field == expected));
    }

    #[test]
    fn rejects_too_many_tags() {
        let tags: Vec<String> = (0..33).map(|i| format!("t{i}")).collect();
        let err = FieldValidator::default()
            .validate(&record(NewRecord::new("a", 1, 1.0).with_tags(tags)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Field { field: "tags", .. }));
    }

    #[test]
    fn rejects_nil_identifier() {
        let r = Record::new(RecordId::from_ulid(Ulid::nil()), NewRecord::new("a", 1, 1.0), Utc::now());
        assert_eq!(FieldValidator::default().validate(&r), Err(ValidationError::NilIdentifier));
    }

    #[test]
    fn rejects_modification_before_creation() {
        let mut r = record(NewRecord::new("a", 1, 1.0));
        r.updated_at = Some(r.created_at - Duration::seconds(1));
        let err = FieldValidator::default().validate(&r).unwrap_err();
        assert!(matches!(err, ValidationError::Field { field: "updated_at", .. }));
    }
}
