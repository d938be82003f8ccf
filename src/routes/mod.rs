use axum::Json;
use serde_json::{Value, json};

use crate::{result::ApiResponse, utils::success_to_api_response};

pub mod metrics;
pub mod stock;

pub async fn health() -> Json<ApiResponse<Value>> {
    success_to_api_response(json!({ "status": "ok" }))
}
