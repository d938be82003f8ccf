use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::model::StockQuery;
use crate::{AppState, error::AppError, services::StockData};

#[axum::debug_handler]
pub async fn get_stock_data(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<StockQuery>,
) -> Result<Json<Vec<StockData>>, AppError> {
    let data = state
        .stocks
        .get_stock_data(&symbol, &query.period, &query.interval)
        .await?;
    Ok(Json(data))
}
