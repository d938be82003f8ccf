use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{Client as RedisClient, aio::MultiplexedConnection};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis 错误: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("存储操作超时 ({0:?})")]
    Timeout(Duration),
}

/// 一次自增后两个窗口的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounts {
    pub minute: u64,
    pub daily: u64,
}

/// 用量计数存储
///
/// `incr_with_expiry` 必须作为一个原子批次执行：
/// 分钟键自增、设置过期、每日键自增、设置过期，
/// 不允许出现只有计数没有过期时间的键。
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn incr_with_expiry(
        &self,
        minute_key: &str,
        minute_ttl_secs: u64,
        daily_key: &str,
        daily_ttl_secs: u64,
    ) -> Result<WindowCounts, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// 分钟键自增、设置过期、每日键自增、设置过期，包在 MULTI/EXEC 内
pub fn usage_pipeline(
    minute_key: &str,
    minute_ttl_secs: u64,
    daily_key: &str,
    daily_ttl_secs: u64,
) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(minute_key, 1)
        .expire(minute_key, minute_ttl_secs as i64)
        .incr(daily_key, 1)
        .expire(daily_key, daily_ttl_secs as i64);
    pipe
}

/// Redis 用量计数
///
/// 复用同一个多路复用连接，出错后丢弃，下一次请求重新建立。
pub struct RedisUsageStore {
    client: RedisClient,
    timeout: Duration,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisUsageStore {
    pub fn new(client: RedisClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            conn: Mutex::new(None),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        let mut cached = self.conn.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        *cached = Some(conn.clone());
        Ok(conn)
    }

    // 连接和命令都受同一个超时约束，超时直接失败，不重试
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, redis::RedisError>> + Send,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };
        if result.is_err() {
            self.conn.lock().await.take();
        }
        result
    }
}

#[async_trait]
impl UsageStore for RedisUsageStore {
    async fn incr_with_expiry(
        &self,
        minute_key: &str,
        minute_ttl_secs: u64,
        daily_key: &str,
        daily_ttl_secs: u64,
    ) -> Result<WindowCounts, StoreError> {
        let pipe = usage_pipeline(minute_key, minute_ttl_secs, daily_key, daily_ttl_secs);
        self.bounded(async {
            let mut conn = self.connection().await?;
            let (minute, _, daily, _): (u64, bool, u64, bool) =
                pipe.query_async(&mut conn).await?;
            Ok(WindowCounts { minute, daily })
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}

/// 进程内用量计数，语义与 redis 实现一致
#[derive(Default)]
pub struct MemoryUsageStore {
    counters: Mutex<HashMap<String, (u64, Instant)>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未过期的键数量
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.counters
            .lock()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 读取当前计数，过期视为不存在
    pub async fn get(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        self.counters
            .lock()
            .await
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(count, _)| *count)
    }

    fn incr(
        counters: &mut HashMap<String, (u64, Instant)>,
        key: &str,
        ttl_secs: u64,
        now: Instant,
    ) -> u64 {
        let entry = counters.entry(key.to_string()).or_insert((0, now));
        if entry.1 <= now {
            entry.0 = 0;
        }
        entry.0 += 1;
        // 每次自增都刷新过期时间
        entry.1 = now + Duration::from_secs(ttl_secs);
        entry.0
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn incr_with_expiry(
        &self,
        minute_key: &str,
        minute_ttl_secs: u64,
        daily_key: &str,
        daily_ttl_secs: u64,
    ) -> Result<WindowCounts, StoreError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;
        counters.retain(|_, (_, expires_at)| *expires_at > now);

        let minute = Self::incr(&mut counters, minute_key, minute_ttl_secs, now);
        let daily = Self::incr(&mut counters, daily_key, daily_ttl_secs, now);
        Ok(WindowCounts { minute, daily })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// 启动时检查存储连通性，按配置的次数和间隔重试
pub async fn wait_for_store(
    store: &dyn UsageStore,
    attempts: u32,
    delay: Duration,
) -> Result<(), StoreError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.ping().await {
            Ok(()) => {
                tracing::info!("Usage store reachable after {} attempt(s)", attempt);
                return Ok(());
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Usage store not reachable (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
