//! Update dispatch.
//!
//! Routes a single webhook update to one of the bot's behaviors:
//!
//! ```text
//! Update ─┬─ "/start" text ─────────────────────→ welcome + mini-app button
//!         ├─ web_app_data {action: generate_report} → relay report text
//!         └─ anything else ──────────────────────→ ignored
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::telegram::{BotApi, BotApiError, InlineKeyboardMarkup, Message, Update};

pub const START_COMMAND: &str = "/start";

pub const GENERATE_REPORT_ACTION: &str = "generate_report";

pub const WELCOME_TEXT: &str = "សូមស្វាគមន៍មកកាន់កម្មវិធីតាមដានចំណាយ! 🎉\n\n\
                                ចុចលើប៊ូតុងខាងក្រោមដើម្បីចាប់ផ្តើម:";

pub const OPEN_APP_BUTTON_TEXT: &str = "បើកកម្មវិធី 📱";

/// Sent when a `generate_report` action arrives without a report.
pub const EMPTY_REPORT_TEXT: &str = "No report data received.";

/// What the dispatcher did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Welcomed,
    ReportRelayed,
    Ignored,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Welcomed => "welcomed",
            DispatchOutcome::ReportRelayed => "report_relayed",
            DispatchOutcome::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid web app data: {0}")]
    InvalidWebAppData(#[from] serde_json::Error),

    #[error("failed to send message: {0}")]
    Send(#[from] BotApiError),
}

/// Payload a mini-app posts through `Telegram.WebApp.sendData`.
#[derive(Debug, Deserialize)]
struct WebAppAction {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    report: Option<String>,
}

/// Handle one update. Performs at most one outbound send.
pub async fn dispatch_update(
    bot: &dyn BotApi,
    webapp_url: &str,
    update: &Update,
) -> Result<DispatchOutcome, DispatchError> {
    let message = match &update.message {
        Some(message) => message,
        None => {
            debug!(update_id = update.update_id, "update_without_message");
            return Ok(DispatchOutcome::Ignored);
        }
    };

    if message.text.as_deref().is_some_and(is_start_command) {
        return send_welcome(bot, webapp_url, message).await;
    }

    if let Some(web_app_data) = &message.web_app_data {
        return handle_web_app_data(bot, message.chat.id, &web_app_data.data).await;
    }

    debug!(
        update_id = update.update_id,
        chat_id = message.chat.id,
        has_text = message.text.is_some(),
        "update_ignored"
    );

    Ok(DispatchOutcome::Ignored)
}

async fn send_welcome(
    bot: &dyn BotApi,
    webapp_url: &str,
    message: &Message,
) -> Result<DispatchOutcome, DispatchError> {
    let markup = InlineKeyboardMarkup::web_app_button(OPEN_APP_BUTTON_TEXT, webapp_url);

    bot.send_message(message.chat.id, WELCOME_TEXT, Some(&markup))
        .await?;

    info!(
        chat_id = message.chat.id,
        user_id = ?message.from.as_ref().map(|u| u.id),
        "start_command_handled"
    );

    Ok(DispatchOutcome::Welcomed)
}

async fn handle_web_app_data(
    bot: &dyn BotApi,
    chat_id: i64,
    data: &str,
) -> Result<DispatchOutcome, DispatchError> {
    let action: WebAppAction = serde_json::from_str(data)?;

    if action.action.as_deref() != Some(GENERATE_REPORT_ACTION) {
        debug!(chat_id = chat_id, action = ?action.action, "web_app_action_ignored");
        return Ok(DispatchOutcome::Ignored);
    }

    let report = action.report.as_deref().unwrap_or(EMPTY_REPORT_TEXT);
    bot.send_message(chat_id, report, None).await?;

    info!(
        chat_id = chat_id,
        report_length = report.len(),
        had_report = action.report.is_some(),
        "web_app_report_relayed"
    );

    Ok(DispatchOutcome::ReportRelayed)
}

/// `/start`, `/start <payload>` and `/start@botname` all count.
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    command == START_COMMAND
}
