//! Status - observed-only な失敗の集計ビュー

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub cache_get: u64,
    pub cache_set: u64,
    pub cache_delete: u64,
    pub event_publish: u64,
}

impl FailureCounts {
    pub fn total(&self) -> u64 {
        self.cache_get + self.cache_set + self.cache_delete + self.event_publish
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}
