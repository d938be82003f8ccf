use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::models::ApiId;
use crate::services::quote_provider::{ProviderError, QuoteProvider, RawBar};
use crate::services::rate_tracker::RateTracker;

pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";

/// 行情数据来源对应的配额
const QUOTE_API: ApiId = ApiId::YahooFinance;

/// 标准化后的行情记录
///
/// 指标字段保留在结构中，目前始终为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub symbol: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub sma_20: Option<f64>,
    pub ema_20: Option<f64>,
    pub rsi: Option<f64>,
}

impl StockData {
    pub fn from_bar(symbol: &str, bar: &RawBar) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            open: round2(bar.open),
            high: round2(bar.high),
            low: round2(bar.low),
            close: round2(bar.close),
            volume: bar.volume as i64,
            sma_20: None,
            ema_20: None,
            rsi: None,
        }
    }
}

// 按浮点数的精确值保留两位小数，恰好一半时取偶数
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// 带配额检查的行情查询
#[derive(Clone)]
pub struct StockService {
    tracker: RateTracker,
    provider: Arc<dyn QuoteProvider>,
}

impl StockService {
    pub fn new(tracker: RateTracker, provider: Arc<dyn QuoteProvider>) -> Self {
        Self { tracker, provider }
    }

    pub async fn get_stock_data(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<StockData>, QuoteError> {
        // 先检查配额，超限时不请求上游
        if !self.tracker.check_rate_limit(QUOTE_API).await {
            tracing::warn!("Rate limit exceeded for {}, refusing {}", QUOTE_API, symbol);
            return Err(QuoteError::RateLimitExceeded);
        }

        let bars = self
            .provider
            .history(symbol, period, interval)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching stock data for {}: {}", symbol, e);
                e
            })?;

        Ok(bars.iter().map(|bar| StockData::from_bar(symbol, bar)).collect())
    }
}
