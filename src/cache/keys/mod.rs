/// 缓存键模块
pub mod usage_keys;

pub use usage_keys::{DAILY_WINDOW_TTL_SECS, MINUTE_WINDOW_TTL_SECS, daily_key, minute_key};
