use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::QuoteError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown api: {0}")]
    UnknownApi(String),
    #[error("Failed to get metrics")]
    MetricsUnavailable,
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("{0}")]
    QuoteFetchFailed(String),
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::RateLimitExceeded => AppError::RateLimitExceeded,
            QuoteError::Provider(e) => AppError::QuoteFetchFailed(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AppError::UnknownApi(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::MetricsUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
            AppError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, error_codes::RATE_LIMIT)
            }
            AppError::QuoteFetchFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::UPSTREAM_ERROR,
            ),
        };

        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}
