use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (compatible; stock-meter/0.1)";

/// 上游返回的一根 K 线
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("请求上游失败: {0}")]
    Http(#[from] reqwest::Error),
    #[error("上游返回错误: {0}")]
    Upstream(String),
    #[error("上游数据格式错误: {0}")]
    Malformed(String),
    #[error("无效的上游地址: {0}")]
    InvalidUrl(String),
}

/// 行情数据来源
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<RawBar>, ProviderError>;
}

/// Yahoo Finance chart 接口
pub struct YahooChartProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url, ProviderError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl QuoteProvider for YahooChartProvider {
    async fn history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let url = self.chart_url(symbol)?;
        tracing::debug!("Fetching chart {} range={} interval={}", url, period, interval);

        let response = self
            .client
            .get(url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match parse_chart(&body) {
            Ok(bars) if status.is_success() => Ok(bars),
            // 错误状态码通常附带 chart.error，优先使用其中的描述
            Err(ProviderError::Upstream(msg)) => Err(ProviderError::Upstream(msg)),
            Ok(_) => Err(ProviderError::Upstream(format!("HTTP {}", status))),
            Err(_) if !status.is_success() => {
                Err(ProviderError::Upstream(format!("HTTP {}", status)))
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize, Default)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Deserialize, Default)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// 解析 chart 响应，时间换算为交易所当地时间，缺失价格的行被丢弃
pub fn parse_chart(body: &str) -> Result<Vec<RawBar>, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(ProviderError::Upstream(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.quote.first() else {
        return Ok(Vec::new());
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            column(&quote.open, i),
            column(&quote.high, i),
            column(&quote.low, i),
            column(&quote.close, i),
        ) else {
            continue;
        };
        let timestamp = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| ProviderError::Malformed(format!("时间戳越界: {}", ts)))?
            .naive_utc();

        bars.push(RawBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: column(&quote.volume, i).unwrap_or(0.0),
        });
    }
    Ok(bars)
}
