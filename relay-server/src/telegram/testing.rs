//! In-memory `BotApi` that records outbound calls.

use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{BotApi, BotApiError};
use super::types::{BotUser, InlineKeyboardMarkup};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Default)]
pub struct RecordingBot {
    sent: Mutex<Vec<SentMessage>>,
    webhooks: Mutex<Vec<(String, Option<String>)>>,
    fail_with: Option<String>,
}

impl RecordingBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a Bot API error carrying `description`.
    pub fn failing(description: &str) -> Self {
        Self {
            fail_with: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn webhooks(&self) -> Vec<(String, Option<String>)> {
        self.webhooks.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), BotApiError> {
        match &self.fail_with {
            Some(description) => Err(BotApiError::Api {
                description: description.clone(),
                error_code: Some(400),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BotApi for RecordingBot {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), BotApiError> {
        self.check()?;
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            reply_markup: reply_markup.cloned(),
        });
        Ok(())
    }

    async fn get_me(&self) -> Result<BotUser, BotApiError> {
        self.check()?;
        Ok(BotUser {
            id: 1,
            is_bot: true,
            first_name: "Spending Tracker".to_string(),
            username: Some("spending_tracker_bot".to_string()),
        })
    }

    async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<(), BotApiError> {
        self.check()?;
        self.webhooks
            .lock()
            .unwrap()
            .push((url.to_string(), secret_token.map(str::to_string)));
        Ok(())
    }
}
