use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个窗口的用量快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUsage {
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl ApiUsage {
    pub fn new(current: u64, limit: u64) -> Self {
        Self {
            current,
            limit,
            remaining: limit.saturating_sub(current),
        }
    }

    pub fn within_limit(&self) -> bool {
        self.current <= self.limit
    }
}

/// 分钟与每日窗口的用量，last_updated 为生成时间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMetrics {
    pub minute_usage: ApiUsage,
    pub daily_usage: ApiUsage,
    pub last_updated: DateTime<Utc>,
}
