use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generative service error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("No text in generative service reply")]
    EmptyReply,

    #[error("{0} already in progress")]
    InFlight(&'static str),

    #[error("Analysis already completed for this batch")]
    AlreadyAnalyzed,

    #[error("No matches loaded; refresh first")]
    NoMatches,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InFlight(_) | AppError::AlreadyAnalyzed => StatusCode::CONFLICT,
            AppError::NoMatches => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
