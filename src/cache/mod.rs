// 缓存模块
// 包含用量计数键、数据结构和存储操作

pub mod keys;
pub mod models;
pub mod operations;

pub use models::{ApiId, ApiLimits, ApiMetrics, ApiUsage};
pub use operations::{MemoryUsageStore, RedisUsageStore, StoreError, UsageStore};
