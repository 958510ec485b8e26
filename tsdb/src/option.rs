use serde::{Deserialize, Serialize};

use crate::error::{TsdbError, TsdbResult};

pub const DEFAULT_SEGMENT_DURATION: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_BLOCK_DURATION: i64 = 2 * 60 * 60 * 1000;

/// Sizing of the per-shard block index. Durations are in milliseconds;
/// segments roll over every `segment_duration` and are sub-divided into
/// `block_duration` windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreOptions {
    pub segment_duration: i64,
    pub block_duration: i64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            segment_duration: DEFAULT_SEGMENT_DURATION,
            block_duration: DEFAULT_BLOCK_DURATION,
        }
    }
}

impl StoreOptions {
    pub fn new(segment_duration: i64, block_duration: i64) -> Self {
        Self {
            segment_duration,
            block_duration,
        }
    }

    pub(crate) fn validated(self) -> TsdbResult<Self> {
        if self.segment_duration <= 0 || self.block_duration <= 0 {
            return Err(TsdbError::InvalidParam {
                reason: "durations must be positive".to_string(),
            });
        }
        if self.block_duration > self.segment_duration {
            return Err(TsdbError::InvalidParam {
                reason: "block duration exceeds segment duration".to_string(),
            });
        }
        if self.segment_duration % self.block_duration != 0 {
            return Err(TsdbError::InvalidParam {
                reason: "segment duration must be a multiple of block duration".to_string(),
            });
        }
        Ok(self)
    }
}
