//! PageRequest - offset/limit ページング
//!
//! 範囲外の値はクランプせず、呼び出し側のエラーとして拒否します。

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    offset: u64,
    limit: u32,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    offset: i64,
    limit: i64,
}

impl PageRequest {
    pub const MIN_LIMIT: u32 = 1;
    pub const MAX_LIMIT: u32 = 50;

    /// transport の生の値を検証して PageRequest にする
    pub fn new(offset: i64, limit: i64) -> Result<Self, ValidationError> {
        if offset < 0 {
            return Err(ValidationError::PageOffset(offset));
        }
        if limit < i64::from(Self::MIN_LIMIT) || limit > i64::from(Self::MAX_LIMIT) {
            return Err(ValidationError::PageLimit {
                got: limit,
                min: Self::MIN_LIMIT,
                max: Self::MAX_LIMIT,
            });
        }
        Ok(Self {
            offset: offset as u64,
            limit: limit as u32,
        })
    }

    /// 最大 limit での先頭ページ
    pub fn first() -> Self {
        Self {
            offset: 0,
            limit: Self::MAX_LIMIT,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 次のページ
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + u64::from(self.limit),
            limit: self.limit,
        }
    }
}

impl<'de> Deserialize<'de> for PageRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPage::deserialize(deserializer)?;
        Self::new(raw.offset, raw.limit).map_err(serde::de::Error::custom)
    }
}
