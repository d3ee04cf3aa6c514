//! Webhook secret-token verification.
//!
//! When a webhook is registered with a `secret_token`, Telegram echoes it in
//! the `X-Telegram-Bot-Api-Secret-Token` header of every update.
//! Reference: https://core.telegram.org/bots/api#setwebhook

use axum::http::HeaderMap;
use tracing::warn;

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Verify the secret-token header against the configured secret.
///
/// Returns `true` when no secret is configured.
pub fn verify_secret_token(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let expected = match expected {
        Some(secret) if !secret.trim().is_empty() => secret,
        _ => return true,
    };

    let provided = match headers.get(SECRET_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(value) => value,
        None => {
            warn!("webhook_secret_token_missing");
            return false;
        }
    };

    let valid = constant_time_compare(expected, provided);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_secret_token_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
