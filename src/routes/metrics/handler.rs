use axum::{
    Json,
    extract::{Path, State},
};

use crate::{AppState, cache::models::ApiId, cache::models::ApiMetrics, error::AppError};

/// 查询用量，本次查询也计入用量
#[axum::debug_handler]
pub async fn get_api_metrics(
    State(state): State<AppState>,
    Path(api_name): Path<String>,
) -> Result<Json<ApiMetrics>, AppError> {
    let Ok(api) = api_name.parse::<ApiId>() else {
        tracing::warn!("Metrics requested for unknown api {}", api_name);
        return Err(AppError::UnknownApi(api_name));
    };

    let metrics = state
        .tracker
        .track_request(api)
        .await
        .map_err(|_| AppError::MetricsUnavailable)?;
    Ok(Json(metrics))
}
