// 业务服务
// 用量统计、行情数据来源和带配额检查的行情查询

pub mod quote_provider;
pub mod rate_tracker;
pub mod stock_service;

pub use quote_provider::{ProviderError, QuoteProvider, RawBar, YahooChartProvider};
pub use rate_tracker::RateTracker;
pub use stock_service::{QuoteError, StockData, StockService};
