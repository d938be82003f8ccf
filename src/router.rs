use axum::{
    Router,
    http::HeaderValue,
    routing::get,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{AppState, middleware::log_errors, routes, ws};

// API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/metrics/{api_name}", get(routes::metrics::get_api_metrics))
        .route("/stock/{symbol}", get(routes::stock::get_stock_data))
}

/// 只放行配置的来源，允许携带凭证
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .nest("/api", api_routes())
        .route("/ws/{client_id}", get(ws::websocket))
        .route("/health", get(routes::health))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(cors)
        .with_state(state)
}
