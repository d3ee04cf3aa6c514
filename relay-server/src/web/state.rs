//! Shared application state.

use std::sync::Arc;

use tracing::info;

use crate::init_data::InitDataVerifier;
use crate::telegram::{BotApi, BotApiError, TelegramClient};
use crate::Config;

/// The bot handle, built once at startup.
///
/// Handlers must match on the variant, so a missing `BOT_TOKEN` is always
/// handled explicitly.
#[derive(Clone)]
pub enum Bot {
    Configured {
        api: Arc<dyn BotApi>,
        verifier: Arc<InitDataVerifier>,
    },
    Unconfigured,
}

impl Bot {
    /// Wrap a Bot API implementation and the verifier for its token.
    pub fn configured(api: Arc<dyn BotApi>, verifier: InitDataVerifier) -> Self {
        Bot::Configured {
            api,
            verifier: Arc::new(verifier),
        }
    }

    /// Build the production handle from configuration.
    pub fn from_config(config: &Config) -> Result<Self, BotApiError> {
        let token = match config.bot_token.as_deref() {
            Some(token) => token,
            None => return Ok(Bot::Unconfigured),
        };

        let client =
            TelegramClient::new(&config.telegram_api_url, token, config.request_timeout())?;

        let mut verifier = InitDataVerifier::new(token);
        if let Some(max_age) = config.init_data_max_age() {
            verifier = verifier.with_max_age(max_age);
        }

        Ok(Bot::configured(Arc::new(client), verifier))
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Bot::Configured { .. })
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bot: Bot,
}

impl AppState {
    pub fn new(config: Config, bot: Bot) -> Self {
        Self {
            config: Arc::new(config),
            bot,
        }
    }

    /// Build state with the real Telegram client.
    pub fn from_config(config: Config) -> Result<Self, BotApiError> {
        let bot = Bot::from_config(&config)?;
        Ok(Self::new(config, bot))
    }

    /// Point Telegram at this server's webhook when `REGISTER_WEBHOOK` is on.
    ///
    /// Returns the registered URL, or `None` when registration was skipped.
    pub async fn register_webhook(&self) -> Result<Option<String>, BotApiError> {
        let api = match &self.bot {
            Bot::Configured { api, .. } => api,
            Bot::Unconfigured => return Ok(None),
        };

        if !self.config.register_webhook {
            return Ok(None);
        }

        let url = match self.config.webhook_url() {
            Some(url) => url,
            None => {
                info!("webhook_registration_skipped_no_public_url");
                return Ok(None);
            }
        };

        api.set_webhook(&url, self.config.webhook_secret.as_deref())
            .await?;

        Ok(Some(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::testing::RecordingBot;
    use std::time::Duration;

    fn state_with(bot: Arc<RecordingBot>, config: Config) -> AppState {
        AppState::new(config, Bot::configured(bot, InitDataVerifier::new("1:abc")))
    }

    #[test]
    fn test_unconfigured_without_token() {
        let bot = Bot::from_config(&Config::default()).unwrap();
        assert!(!bot.is_configured());
    }

    #[test]
    fn test_configured_with_token() {
        let config = Config {
            bot_token: Some("1:abc".to_string()),
            init_data_max_age: 600,
            ..Config::default()
        };

        match Bot::from_config(&config).unwrap() {
            Bot::Configured { verifier, .. } => {
                assert_eq!(verifier.max_age(), Some(Duration::from_secs(600)));
            }
            Bot::Unconfigured => panic!("Expected configured bot"),
        }
    }

    #[tokio::test]
    async fn test_register_webhook() {
        let bot = Arc::new(RecordingBot::new());
        let config = Config {
            public_url: Some("https://relay.example.com".to_string()),
            webhook_secret: Some("hook-secret".to_string()),
            register_webhook: true,
            ..Config::default()
        };

        let url = state_with(bot.clone(), config).register_webhook().await.unwrap();

        assert_eq!(url.as_deref(), Some("https://relay.example.com/api/webhook"));
        assert_eq!(
            bot.webhooks(),
            vec![(
                "https://relay.example.com/api/webhook".to_string(),
                Some("hook-secret".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_register_webhook_skipped() {
        let bot = Arc::new(RecordingBot::new());
        let disabled = Config {
            public_url: Some("https://relay.example.com".to_string()),
            ..Config::default()
        };
        let no_url = Config {
            register_webhook: true,
            ..Config::default()
        };

        assert_eq!(state_with(bot.clone(), disabled).register_webhook().await.unwrap(), None);
        assert_eq!(state_with(bot.clone(), no_url).register_webhook().await.unwrap(), None);
        assert!(bot.webhooks().is_empty());

        let unconfigured = AppState::new(Config::default(), Bot::Unconfigured);
        assert_eq!(unconfigured.register_webhook().await.unwrap(), None);
    }
}
