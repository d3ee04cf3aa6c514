//! Mini-app init-data verification.
//!
//! Telegram signs the init-data string handed to a mini-app with HMAC-SHA256.
//! Reference: https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app
//!
//! The check-string is every field except `hash`, sorted by key and joined
//! with `\n`. The signing key is `HMAC-SHA256(key = "WebAppData", msg = bot_token)`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

const HASH_FIELD: &str = "hash";
const USER_FIELD: &str = "user";
const AUTH_DATE_FIELD: &str = "auth_date";

/// Length of a hex-encoded SHA256 digest.
const HASH_HEX_LEN: usize = 64;

/// Tolerated clock skew for `auth_date` values in the future.
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// The init data could not be authenticated.
///
/// Every failure (missing hash, bad signature, malformed user field, expired
/// payload) collapses into this one value so callers cannot leak which check
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid init data")]
pub struct InvalidInitData;

/// The `user` object embedded in verified init data.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaim {
    /// Telegram user id, also the private chat id for that user
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// The decoded `user` JSON exactly as signed
    pub raw: Value,
}

impl IdentityClaim {
    fn from_json(raw: Value) -> Option<Self> {
        let id = raw.get("id")?.as_i64()?;
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_owned);
        let username = text("username");
        let first_name = text("first_name");

        Some(Self {
            id,
            username,
            first_name,
            raw,
        })
    }
}

/// Verifies init data against one bot token.
///
/// The signing key is derived once at construction. The verifier holds no
/// mutable state and can be shared freely between tasks.
#[derive(Clone)]
pub struct InitDataVerifier {
    signing_key: [u8; 32],
    max_age: Option<Duration>,
}

impl fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("signing_key", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl InitDataVerifier {
    pub fn new(bot_token: &str) -> Self {
        Self {
            signing_key: signing_key(bot_token),
            max_age: None,
        }
    }

    /// Reject payloads whose `auth_date` is older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Verify a raw init-data query string and extract the user claim.
    pub fn verify(&self, init_data: &str) -> Result<IdentityClaim, InvalidInitData> {
        self.verify_at(init_data, SystemTime::now())
    }

    fn verify_at(&self, init_data: &str, now: SystemTime) -> Result<IdentityClaim, InvalidInitData> {
        if init_data.is_empty() {
            warn!("init_data_empty");
            return Err(InvalidInitData);
        }

        let ParsedInitData { fields, hash } = match ParsedInitData::parse(init_data) {
            Some(parsed) => parsed,
            None => {
                warn!(field_count = init_data.split('&').count(), "init_data_missing_hash");
                return Err(InvalidInitData);
            }
        };

        let provided = match decode_hash(&hash) {
            Some(bytes) => bytes,
            None => {
                warn!(hash_length = hash.len(), "init_data_malformed_hash");
                return Err(InvalidInitData);
            }
        };

        let mut mac = new_mac(&self.signing_key);
        mac.update(render_check_string(&fields).as_bytes());

        // verify_slice compares in constant time
        if mac.verify_slice(&provided).is_err() {
            warn!(field_count = fields.len(), "init_data_signature_mismatch");
            return Err(InvalidInitData);
        }

        if let Some(max_age) = self.max_age {
            check_auth_date(fields.get(AUTH_DATE_FIELD).map(String::as_str), max_age, now)?;
        }

        let user = match fields.get(USER_FIELD) {
            Some(user) => user,
            None => {
                warn!("init_data_missing_user");
                return Err(InvalidInitData);
            }
        };

        let raw: Value = match serde_json::from_str(user) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "init_data_user_not_json");
                return Err(InvalidInitData);
            }
        };

        IdentityClaim::from_json(raw).ok_or_else(|| {
            warn!("init_data_user_missing_id");
            InvalidInitData
        })
    }
}

/// Verify `init_data` signed for `bot_token`, without an expiry window.
pub fn verify(init_data: &str, bot_token: &str) -> Result<IdentityClaim, InvalidInitData> {
    InitDataVerifier::new(bot_token).verify(init_data)
}

/// Build the canonical check-string for `init_data`.
///
/// Returns `(check_string, hash)`, or `None` when the payload has no hash.
pub fn check_string(init_data: &str) -> Option<(String, String)> {
    let parsed = ParsedInitData::parse(init_data)?;
    Some((render_check_string(&parsed.fields), parsed.hash))
}

/// Derive the per-bot signing key from the bot token.
pub fn signing_key(bot_token: &str) -> [u8; 32] {
    let mut mac = new_mac(WEB_APP_DATA_KEY);
    mac.update(bot_token.as_bytes());

    let mut key = [0u8; 32];
    key.copy_from_slice(&mac.finalize().into_bytes());
    key
}

/// Produce a signed init-data query string from `pairs`.
///
/// Pairs are emitted in the given order with `hash` appended last. Any `hash`
/// pair in the input is replaced.
pub fn sign(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let fields = collect_fields(
        pairs
            .iter()
            .filter(|(key, _)| *key != HASH_FIELD)
            .map(|&(key, value)| (Cow::Borrowed(key), Cow::Borrowed(value))),
    );

    let mut mac = new_mac(&signing_key(bot_token));
    mac.update(render_check_string(&fields).as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(pairs.iter().filter(|(key, _)| *key != HASH_FIELD));
    serializer.append_pair(HASH_FIELD, &hash);
    serializer.finish()
}

struct ParsedInitData {
    /// Every field except `hash`, ordered by key
    fields: BTreeMap<String, String>,
    hash: String,
}

impl ParsedInitData {
    fn parse(init_data: &str) -> Option<Self> {
        let mut fields = collect_fields(form_urlencoded::parse(init_data.as_bytes()));
        let hash = fields.remove(HASH_FIELD)?;
        Some(Self { fields, hash })
    }
}

/// First non-empty value wins for each key. Blank values are dropped the way
/// standard query-string parsers drop them.
fn collect_fields<'a, I>(pairs: I) -> BTreeMap<String, String>
where
    I: Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
{
    let mut fields = BTreeMap::new();
    for (key, value) in pairs {
        if value.is_empty() {
            continue;
        }
        fields
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    fields
}

fn render_check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode a lowercase hex SHA256 digest.
fn decode_hash(hash: &str) -> Option<Vec<u8>> {
    let well_formed = hash.len() == HASH_HEX_LEN
        && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !well_formed {
        return None;
    }
    hex::decode(hash).ok()
}

fn check_auth_date(
    auth_date: Option<&str>,
    max_age: Duration,
    now: SystemTime,
) -> Result<(), InvalidInitData> {
    let auth_date: u64 = match auth_date.map(str::parse::<u64>) {
        Some(Ok(t)) => t,
        Some(Err(_)) | None => {
            warn!(has_auth_date = auth_date.is_some(), "init_data_invalid_auth_date");
            return Err(InvalidInitData);
        }
    };

    let current_time = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if auth_date > current_time + MAX_CLOCK_SKEW_SECS {
        warn!(auth_date, current_time, "init_data_auth_date_in_future");
        return Err(InvalidInitData);
    }

    let age = current_time.saturating_sub(auth_date);
    if age > max_age.as_secs() {
        warn!(
            auth_date,
            current_time,
            age_seconds = age,
            max_age_seconds = max_age.as_secs(),
            "init_data_expired"
        );
        return Err(InvalidInitData);
    }

    Ok(())
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}
