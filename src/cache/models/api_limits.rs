use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// 受统计的上游 API
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiId {
    AlphaVantage,
    Finnhub,
    YahooFinance,
}

/// 单个 API 的固定配额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiLimits {
    pub calls_per_minute: u64,
    pub calls_per_day: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitTableError {
    #[error("{0} 的配额不能为 0")]
    Zero(ApiId),
    #[error("{0} 的每分钟配额大于每日配额")]
    MinuteExceedsDay(ApiId),
}

impl ApiLimits {
    pub const fn for_api(api: ApiId) -> Self {
        match api {
            ApiId::AlphaVantage => ApiLimits {
                calls_per_minute: 5,
                calls_per_day: 500,
            },
            ApiId::Finnhub => ApiLimits {
                calls_per_minute: 60,
                calls_per_day: 1500,
            },
            ApiId::YahooFinance => ApiLimits {
                calls_per_minute: 100,
                calls_per_day: 2000,
            },
        }
    }
}

/// 启动时校验配额表
pub fn validate_limit_table() -> Result<(), LimitTableError> {
    for api in ApiId::iter() {
        let limits = ApiLimits::for_api(api);
        if limits.calls_per_minute == 0 || limits.calls_per_day == 0 {
            return Err(LimitTableError::Zero(api));
        }
        if limits.calls_per_minute > limits.calls_per_day {
            return Err(LimitTableError::MinuteExceedsDay(api));
        }
    }
    Ok(())
}
