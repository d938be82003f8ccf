use serde::Deserialize;

use crate::services::stock_service::{DEFAULT_INTERVAL, DEFAULT_PERIOD};

/// period 和 interval 原样转发给上游
#[derive(Debug, Deserialize)]
pub struct StockQuery {
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}
