/// 缓存数据模型
pub mod api_limits;
pub mod usage;

pub use api_limits::{ApiId, ApiLimits, LimitTableError, validate_limit_table};
pub use usage::{ApiMetrics, ApiUsage};
