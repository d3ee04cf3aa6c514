//! Web server module.
//!
//! This module provides the HTTP surface of the relay:
//! - `POST /api/webhook`: Telegram update delivery
//! - `POST /api/send-report`: report submission from the mini-app
//! - `GET /` and `GET /api/index`: status with webhook URL and bot identity
//! - `GET /health`: liveness probe

pub mod error;
pub mod handlers;
pub mod secret_token;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ReportResponse};
pub use handlers::{
    health, send_report, status, webhook, HealthResponse, ReportRequest, StatusResponse,
};
pub use secret_token::{verify_secret_token, SECRET_TOKEN_HEADER};
pub use state::{AppState, Bot};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/api/index", get(status))
        .route("/health", get(health))
        .route("/api/webhook", post(webhook))
        .route("/api/send-report", post(send_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
