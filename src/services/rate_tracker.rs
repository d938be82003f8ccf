use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::keys::{DAILY_WINDOW_TTL_SECS, MINUTE_WINDOW_TTL_SECS, daily_key, minute_key};
use crate::cache::models::{ApiId, ApiLimits, ApiMetrics, ApiUsage};
use crate::cache::operations::{StoreError, UsageStore};

/// 固定窗口用量统计
///
/// 每次调用都会计入分钟和每日两个窗口，查询用量本身也算一次使用。
#[derive(Clone)]
pub struct RateTracker {
    store: Arc<dyn UsageStore>,
}

impl RateTracker {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    pub async fn track_request(&self, api: ApiId) -> Result<ApiMetrics, StoreError> {
        self.track_request_at(api, Utc::now()).await
    }

    /// 以指定时间所在的窗口计数
    pub async fn track_request_at(
        &self,
        api: ApiId,
        now: DateTime<Utc>,
    ) -> Result<ApiMetrics, StoreError> {
        let minute_key = minute_key(api, now);
        let daily_key = daily_key(api, now);

        let counts = self
            .store
            .incr_with_expiry(
                &minute_key,
                MINUTE_WINDOW_TTL_SECS,
                &daily_key,
                DAILY_WINDOW_TTL_SECS,
            )
            .await
            .map_err(|e| {
                tracing::error!("Error tracking request for {}: {}", api, e);
                e
            })?;

        let limits = ApiLimits::for_api(api);
        Ok(ApiMetrics {
            minute_usage: ApiUsage::new(counts.minute, limits.calls_per_minute),
            daily_usage: ApiUsage::new(counts.daily, limits.calls_per_day),
            last_updated: Utc::now(),
        })
    }

    /// 两个窗口都未超限时返回 true，统计失败时拒绝
    pub async fn check_rate_limit(&self, api: ApiId) -> bool {
        self.check_rate_limit_at(api, Utc::now()).await
    }

    pub async fn check_rate_limit_at(&self, api: ApiId, now: DateTime<Utc>) -> bool {
        match self.track_request_at(api, now).await {
            Ok(metrics) => metrics.minute_usage.within_limit() && metrics.daily_usage.within_limit(),
            Err(_) => false,
        }
    }
}
