//! HTTP endpoint handlers.
//!
//! - `webhook`: Telegram update delivery. Never answers 5xx once the bot is
//!   configured, so Telegram does not redeliver failed updates.
//! - `send_report`: report submission from the mini-app, authenticated by
//!   its signed init data.
//! - `status` / `health`: operational probes.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dispatch::dispatch_update;
use crate::telegram::Update;
use crate::web::error::{ApiError, ReportResponse};
use crate::web::secret_token::verify_secret_token;
use crate::web::state::{AppState, Bot};

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            webhook_url: None,
            bot_username: None,
            message: Some(message.into()),
        }
    }
}

/// Reports the webhook URL and the bot identity from `getMe`.
pub async fn status(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    let api = match &state.bot {
        Bot::Configured { api, .. } => api,
        Bot::Unconfigured => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error("BOT_TOKEN not set")),
            );
        }
    };

    match api.get_me().await {
        Ok(me) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "running",
                webhook_url: state.config.webhook_url(),
                bot_username: me.username,
                message: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "status_get_me_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(e.to_string())),
            )
        }
    }
}

// =============================================================================
// Telegram Webhook
// =============================================================================

/// Telegram webhook endpoint.
///
/// This endpoint:
/// 1. Checks the secret-token header (if configured)
/// 2. Decodes the update and dispatches it
/// 3. Returns 200 OK even when decoding or dispatch fails
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let api = match &state.bot {
        Bot::Configured { api, .. } => api,
        Bot::Unconfigured => {
            warn!("webhook_bot_not_initialized");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Bot not initialized");
        }
    };

    if !verify_secret_token(&headers, state.config.webhook_secret.as_deref()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    if !is_json_content_type(&headers) {
        warn!(
            content_type = ?headers.get(header::CONTENT_TYPE),
            "webhook_invalid_content_type"
        );
        return (StatusCode::BAD_REQUEST, "Error: Invalid content type");
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "webhook_parse_failed");
            return (StatusCode::OK, "OK");
        }
    };

    info!(
        update_id = update.update_id,
        has_message = update.message.is_some(),
        "webhook_update_received"
    );

    match dispatch_update(&**api, &state.config.webapp_url, &update).await {
        Ok(outcome) => {
            info!(
                update_id = update.update_id,
                outcome = outcome.as_str(),
                "webhook_update_handled"
            );
        }
        Err(e) => {
            error!(update_id = update.update_id, error = %e, "webhook_dispatch_failed");
        }
    }

    (StatusCode::OK, "OK")
}

/// Media type must be `application/json`; parameters such as charset are ignored.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

// =============================================================================
// Report Submission
// =============================================================================

/// Report submission from the mini-app.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default, rename = "initData")]
    pub init_data: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
}

/// Report endpoint.
///
/// Verifies the init data, then sends `report` to the chat of the user the
/// init data was signed for. Nothing is sent unless verification succeeds.
pub async fn send_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReportResponse>, ApiError> {
    let (api, verifier) = match &state.bot {
        Bot::Configured { api, verifier } => (api, verifier),
        Bot::Unconfigured => {
            warn!("send_report_bot_not_initialized");
            return Err(ApiError::ConfigMissing);
        }
    };

    let request: ReportRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body_length = body.len(), "send_report_invalid_body");
        ApiError::MalformedRequest
    })?;

    let (init_data, report) = match (
        request.init_data.filter(|v| !v.is_empty()),
        request.report.filter(|v| !v.is_empty()),
    ) {
        (Some(init_data), Some(report)) => (init_data, report),
        (init_data, report) => {
            warn!(
                has_init_data = init_data.is_some(),
                has_report = report.is_some(),
                "send_report_missing_data"
            );
            return Err(ApiError::MalformedRequest);
        }
    };

    let claim = verifier.verify(&init_data).map_err(|_| {
        warn!(init_data_length = init_data.len(), "send_report_invalid_init_data");
        ApiError::Unauthorized
    })?;

    if let Err(e) = api.send_message(claim.id, &report, None).await {
        error!(chat_id = claim.id, error = %e, "send_report_failed");
        return Err(ApiError::UpstreamSendFailure(e.to_string()));
    }

    info!(
        chat_id = claim.id,
        username = ?claim.username,
        report_length = report.len(),
        "report_sent"
    );

    Ok(Json(ReportResponse::ok()))
}
