/// 缓存操作
pub mod usage;

pub use usage::{
    MemoryUsageStore, RedisUsageStore, StoreError, UsageStore, WindowCounts, wait_for_store,
};
