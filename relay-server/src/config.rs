//! Configuration module for environment variable parsing.
//!
//! Everything is read once at process start; there is no reload.

use std::env;
use std::fmt;
use std::time::Duration;

use tracing::warn;

/// Mini-app opened by the `/start` button when `WEBAPP_URL` is unset.
pub const DEFAULT_WEBAPP_URL: &str = "https://yi-spending-tracker-mini-app.vercel.app/";

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Path Telegram delivers updates to.
pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Bot credential; `None` leaves the bot unconfigured
    pub bot_token: Option<String>,

    /// Externally reachable base URL, always with a scheme and no trailing slash
    pub public_url: Option<String>,

    /// URL the mini-app launch button opens
    pub webapp_url: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Bot API base URL
    pub telegram_api_url: String,

    /// Timeout for outbound Bot API requests
    pub request_timeout_ms: u64,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header on webhook calls
    pub webhook_secret: Option<String>,

    /// Maximum init-data age in seconds; 0 disables the check
    pub init_data_max_age: u64,

    /// Call `setWebhook` with `webhook_url()` at startup
    pub register_webhook: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot_token: None,
            public_url: None,
            webapp_url: DEFAULT_WEBAPP_URL.to_string(),
            port: 8080,
            telegram_api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            request_timeout_ms: 10_000,
            webhook_secret: None,
            init_data_max_age: 0,
            register_webhook: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token_set", &self.bot_token.is_some())
            .field("public_url", &self.public_url)
            .field("webapp_url", &self.webapp_url)
            .field("port", &self.port)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("webhook_secret_set", &self.webhook_secret.is_some())
            .field("init_data_max_age", &self.init_data_max_age)
            .field("register_webhook", &self.register_webhook)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            bot_token: non_empty("BOT_TOKEN"),

            public_url: non_empty("PUBLIC_URL")
                .or_else(|| non_empty("VERCEL_URL"))
                .and_then(|raw| normalize_base_url(&raw)),

            webapp_url: non_empty("WEBAPP_URL").unwrap_or(defaults.webapp_url),

            port: parse_or("PORT", defaults.port),

            telegram_api_url: non_empty("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            webhook_secret: non_empty("WEBHOOK_SECRET"),

            init_data_max_age: parse_or("INIT_DATA_MAX_AGE", defaults.init_data_max_age),

            register_webhook: parse_bool("REGISTER_WEBHOOK"),
        }
    }

    /// Full webhook URL, if the public base URL is known.
    pub fn webhook_url(&self) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}{}", base, WEBHOOK_PATH))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn init_data_max_age(&self) -> Option<Duration> {
        match self.init_data_max_age {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Accepts `host`, `host/` or `https://host/` and yields `https://host`.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains("://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

fn parse_bool(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("relay.vercel.app"),
            Some("https://relay.vercel.app".to_string())
        );
        assert_eq!(
            normalize_base_url("https://relay.example.com/"),
            Some("https://relay.example.com".to_string())
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080"),
            Some("http://localhost:8080".to_string())
        );
        assert_eq!(normalize_base_url("  "), None);
    }

    #[test]
    fn test_webhook_url() {
        let config = Config {
            public_url: Some("https://relay.example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.webhook_url(),
            Some("https://relay.example.com/api/webhook".to_string())
        );
        assert_eq!(Config::default().webhook_url(), None);
    }

    #[test]
    fn test_init_data_max_age() {
        assert_eq!(Config::default().init_data_max_age(), None);

        let config = Config {
            init_data_max_age: 86_400,
            ..Config::default()
        };
        assert_eq!(config.init_data_max_age(), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_parse_or() {
        env::set_var("RELAY_TEST_PORT", "9090");
        assert_eq!(parse_or("RELAY_TEST_PORT", 8080u16), 9090);
        env::set_var("RELAY_TEST_PORT", "not-a-port");
        assert_eq!(parse_or("RELAY_TEST_PORT", 8080u16), 8080);
        env::remove_var("RELAY_TEST_PORT");
        assert_eq!(parse_or("RELAY_TEST_PORT", 8080u16), 8080);
    }

    #[test]
    fn test_non_empty_and_bool() {
        env::set_var("RELAY_TEST_BLANK", "   ");
        assert_eq!(non_empty("RELAY_TEST_BLANK"), None);
        env::remove_var("RELAY_TEST_BLANK");

        env::set_var("RELAY_TEST_FLAG", "TRUE");
        assert!(parse_bool("RELAY_TEST_FLAG"));
        env::set_var("RELAY_TEST_FLAG", "0");
        assert!(!parse_bool("RELAY_TEST_FLAG"));
        env::remove_var("RELAY_TEST_FLAG");
        assert!(!parse_bool("RELAY_TEST_FLAG"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config {
            bot_token: Some("1:very-secret".to_string()),
            webhook_secret: Some("hook-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("hook-secret"));
    }
}
