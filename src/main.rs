use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use stock_meter::{
    AppState,
    cache::models::validate_limit_table,
    cache::operations::{MemoryUsageStore, RedisUsageStore, UsageStore, wait_for_store},
    config::{Config, StoreBackend},
    router::create_router,
    services::{QuoteProvider, YahooChartProvider},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    validate_limit_table().expect("Invalid API limit table");

    // 设置用量存储
    let store: Arc<dyn UsageStore> = match config.store_backend {
        StoreBackend::Redis => {
            let client = redis::Client::open(config.redis_url.clone())
                .expect("Failed to create Redis client");
            let store = RedisUsageStore::new(client, config.redis_timeout());
            // 连不上时继续启动，请求阶段按失败处理并拒绝配额
            if let Err(e) = wait_for_store(
                &store,
                config.redis_retry_attempts,
                config.redis_retry_delay(),
            )
            .await
            {
                tracing::error!("Redis unreachable at startup, quota checks will fail closed: {}", e);
            }
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory usage store, counters are not shared between processes");
            Arc::new(MemoryUsageStore::new())
        }
    };

    let provider: Arc<dyn QuoteProvider> = Arc::new(
        YahooChartProvider::new(config.yahoo_base_url.clone())
            .expect("Failed to create quote provider"),
    );

    let state = AppState::new(config.clone(), store, provider);
    let app = create_router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
