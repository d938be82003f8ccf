use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// 计数存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少环境变量 {0}")]
    Missing(&'static str),
    #[error("环境变量 {var} 的值无效: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub redis_retry_attempts: u32,
    pub redis_retry_delay_secs: u64,
    pub redis_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
    pub alpha_vantage_key: Option<String>,
    pub finnhub_key: Option<String>,
    pub yahoo_key: Option<String>,
    pub polygon_key: Option<String>,
    pub yahoo_base_url: String,
    pub server_host: String,
    pub server_port: u16,
}

const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let store_backend = match optional("STORE_BACKEND").as_deref() {
            None | Some("redis") => StoreBackend::Redis,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        // 内存后端不需要 redis 地址
        let redis_url = match (store_backend, optional("REDIS_URL")) {
            (_, Some(url)) => url,
            (StoreBackend::Memory, None) => String::new(),
            (StoreBackend::Redis, None) => return Err(ConfigError::Missing("REDIS_URL")),
        };

        Ok(Config {
            store_backend,
            redis_url,
            redis_retry_attempts: parsed("REDIS_RETRY_ATTEMPTS", 5)?,
            redis_retry_delay_secs: parsed("REDIS_RETRY_DELAY", 1)?,
            redis_timeout_secs: non_zero("REDIS_TIMEOUT", parsed("REDIS_TIMEOUT", 5)?)?,
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_else(|| vec![DEFAULT_ALLOWED_ORIGIN.to_string()]),
            alpha_vantage_key: optional("ALPHA_VANTAGE_KEY"),
            finnhub_key: optional("FINNHUB_KEY"),
            yahoo_key: optional("YAHOO_KEY"),
            polygon_key: optional("POLYGON_KEY"),
            yahoo_base_url: optional("YAHOO_BASE_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parsed("SERVER_PORT", 8000)?,
        })
    }

    pub fn redis_retry_delay(&self) -> Duration {
        Duration::from_secs(self.redis_retry_delay_secs)
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_timeout_secs)
    }
}

impl Default for Config {
    /// 测试和本地运行用的内存后端配置
    fn default() -> Self {
        Config {
            store_backend: StoreBackend::Memory,
            redis_url: String::new(),
            redis_retry_attempts: 5,
            redis_retry_delay_secs: 1,
            redis_timeout_secs: 5,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            alpha_vantage_key: None,
            finnhub_key: None,
            yahoo_key: None,
            polygon_key: None,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
        }
    }
}

fn optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(var) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

// 为 0 时每次存储操作都会立即超时
fn non_zero(var: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// 逗号分隔的来源列表
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
