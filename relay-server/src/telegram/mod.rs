//! Telegram Bot API plumbing.
//!
//! This module provides:
//! - The subset of Bot API types the relay reads and sends
//! - The `BotApi` trait the handlers talk to
//! - `TelegramClient`, the HTTPS implementation of `BotApi`

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BotApi, BotApiError, TelegramClient};
pub use types::{
    BotUser, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update, User,
    WebAppData, WebAppInfo,
};
