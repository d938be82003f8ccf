use chrono::{DateTime, Utc};

use crate::cache::models::ApiId;

/// 用量计数键前缀
const API_USAGE_PREFIX: &str = "api_usage:";

/// 分钟窗口过期时间，单位秒
pub const MINUTE_WINDOW_TTL_SECS: u64 = 60;

/// 每日窗口过期时间，单位秒
pub const DAILY_WINDOW_TTL_SECS: u64 = 24 * 60 * 60;

/// 生成分钟窗口计数键
pub fn minute_key(api: ApiId, now: DateTime<Utc>) -> String {
    format!(
        "{}{}:minute:{}",
        API_USAGE_PREFIX,
        api,
        now.format("%Y-%m-%d-%H-%M")
    )
}

/// 生成每日窗口计数键
pub fn daily_key(api: ApiId, now: DateTime<Utc>) -> String {
    format!("{}{}:daily:{}", API_USAGE_PREFIX, api, now.format("%Y-%m-%d"))
}
