//! Bot API client.
//!
//! Every method is a JSON POST to `{api_base}/bot{token}/{method}`; responses
//! come back in the `{ok, result, description}` envelope.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::types::{BotUser, InlineKeyboardMarkup};

/// Errors returned by Bot API calls.
#[derive(Debug, Error)]
pub enum BotApiError {
    /// Transport failure. The URL is stripped so the token never reaches logs.
    #[error("request to Telegram failed: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API error: {description}")]
    Api {
        description: String,
        error_code: Option<i64>,
    },

    #[error("Telegram API returned ok without a result")]
    MissingResult,
}

impl From<reqwest::Error> for BotApiError {
    fn from(e: reqwest::Error) -> Self {
        BotApiError::Http(e.without_url())
    }
}

/// The Bot API operations the relay depends on.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a text message, optionally with an inline keyboard.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), BotApiError>;

    /// Identity of the bot the token belongs to.
    async fn get_me(&self) -> Result<BotUser, BotApiError>;

    /// Point Telegram's update delivery at `url`.
    async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), BotApiError>;
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: &'a [&'a str],
}

/// HTTPS client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    /// `{api_base}/bot{token}`
    endpoint: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self, BotApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, BotApiError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.endpoint, method))
            .json(params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: ApiResponse<T> = response.json().await?;

        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("HTTP status {}", status));
            warn!(
                method = method,
                status_code = status,
                error_code = ?body.error_code,
                description = %description,
                "telegram_api_error"
            );
            return Err(BotApiError::Api {
                description,
                error_code: body.error_code,
            });
        }

        body.result.ok_or(BotApiError::MissingResult)
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), BotApiError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup,
        };

        let _: serde_json::Value = self.call("sendMessage", &request).await?;

        info!(
            chat_id = chat_id,
            text_length = text.len(),
            has_markup = reply_markup.is_some(),
            "telegram_message_sent"
        );

        Ok(())
    }

    async fn get_me(&self) -> Result<BotUser, BotApiError> {
        self.call("getMe", &json!({})).await
    }

    async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), BotApiError> {
        let request = SetWebhookRequest {
            url,
            secret_token,
            allowed_updates: &["message"],
        };

        let _: bool = self.call("setWebhook", &request).await?;

        info!(url = %url, has_secret = secret_token.is_some(), "telegram_webhook_set");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client =
            TelegramClient::new("https://api.telegram.org/", "1:abc", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint, "https://api.telegram.org/bot1:abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let client =
            TelegramClient::new("https://api.telegram.org", "1:secret", Duration::from_secs(1))
                .unwrap();
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[test]
    fn test_send_message_request_shape() {
        let markup = InlineKeyboardMarkup::web_app_button("Open", "https://app.example.com/");
        let with_markup = serde_json::to_value(SendMessageRequest {
            chat_id: 42,
            text: "hi",
            reply_markup: Some(&markup),
        })
        .unwrap();
        let plain = serde_json::to_value(SendMessageRequest {
            chat_id: 42,
            text: "hi",
            reply_markup: None,
        })
        .unwrap();

        assert_eq!(with_markup["reply_markup"]["inline_keyboard"][0][0]["text"], "Open");
        assert!(plain.get("reply_markup").is_none());
    }

    #[test]
    fn test_api_error_envelope() {
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap();

        assert!(!body.ok);
        assert!(body.result.is_none());
        assert_eq!(body.error_code, Some(400));

        let err = BotApiError::Api {
            description: body.description.unwrap(),
            error_code: body.error_code,
        };
        assert_eq!(err.to_string(), "Telegram API error: Bad Request: chat not found");
    }
}
