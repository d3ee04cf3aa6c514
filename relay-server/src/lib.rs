//! Mini-app relay - webhook bridge between the Telegram Bot API and a
//! reporting mini-app.
//!
//! This library provides the modules behind two binaries:
//! - `relay-web`: web server for the webhook, report and status endpoints
//! - `sign-init-data`: developer tool that prints signed init data
//!
//! ## Architecture
//!
//! ```text
//! Telegram → /api/webhook ─────→ dispatch ──┐
//!                                            ├→ BotApi::send_message → Telegram
//! Mini-app → /api/send-report → init_data ──┘
//! ```

pub mod config;
pub mod dispatch;
pub mod init_data;
pub mod telegram;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{dispatch_update, DispatchError, DispatchOutcome};
pub use init_data::{verify, IdentityClaim, InitDataVerifier, InvalidInitData};
pub use telegram::{BotApi, BotApiError, TelegramClient, Update};
pub use web::{router, AppState, Bot};
