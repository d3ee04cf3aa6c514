//! Report endpoint errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the report endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `BOT_TOKEN` is unset
    #[error("Bot not initialized")]
    ConfigMissing,

    /// Body is not JSON, or `initData` / `report` is missing or empty
    #[error("Missing data")]
    MalformedRequest,

    /// Init data failed verification
    #[error("Invalid init data")]
    Unauthorized,

    /// The outbound send failed; carries the client error message
    #[error("{0}")]
    UpstreamSendFailure(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ConfigMissing => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MalformedRequest => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::UpstreamSendFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every report endpoint response.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ReportResponse::failed(self.to_string()))).into_response()
    }
}
