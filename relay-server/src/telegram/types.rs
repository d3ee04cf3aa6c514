//! Bot API object types.
//!
//! Only the fields the relay reads are modelled; everything else in an
//! incoming update is ignored during deserialization.

use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound Types (webhook updates)
// =============================================================================

/// An incoming update delivered to the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    /// Sender; absent for channel posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Data sent from a mini-app via `Telegram.WebApp.sendData`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_app_data: Option<WebAppData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAppData {
    /// Raw string sent by the mini-app
    pub data: String,
    #[serde(default)]
    pub button_text: String,
}

// =============================================================================
// Outbound Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// A single button that opens the mini-app at `url`.
    pub fn web_app_button(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: text.into(),
                web_app: Some(WebAppInfo { url: url.into() }),
            }]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppInfo {
    pub url: String,
}

/// Result of `getMe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_ignores_unknown_fields() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Dara"},
                "from": {"id": 42, "is_bot": false, "first_name": "Dara", "language_code": "km"},
                "text": "/start",
                "entities": [{"type": "bot_command", "offset": 0, "length": 6}]
            }
        }))
        .unwrap();

        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.chat.kind.as_deref(), Some("private"));
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert_eq!(message.from.unwrap().first_name, "Dara");
        assert!(message.web_app_data.is_none());
    }

    #[test]
    fn test_update_without_message() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 11,
            "edited_message": {"message_id": 1, "chat": {"id": 1}}
        }))
        .unwrap();

        assert!(update.message.is_none());
    }

    #[test]
    fn test_web_app_button_shape() {
        let markup = InlineKeyboardMarkup::web_app_button("Open", "https://app.example.com/");
        let value = serde_json::to_value(&markup).unwrap();

        assert_eq!(
            value,
            json!({
                "inline_keyboard": [[{
                    "text": "Open",
                    "web_app": {"url": "https://app.example.com/"}
                }]]
            })
        );
    }
}
