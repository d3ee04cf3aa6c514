//! Print signed mini-app init data for local testing.
//!
//! Usage: `BOT_TOKEN=... sign-init-data <user_id> [first_name] [username]`
//!
//! The output can be pasted as `initData` into a request to
//! `/api/send-report`.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::{init_data, Config};

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);

    let user_id: i64 = match args.next() {
        Some(raw) => raw.parse().context("user_id must be an integer")?,
        None => bail!("usage: sign-init-data <user_id> [first_name] [username]"),
    };
    let first_name = args.next().unwrap_or_else(|| "Test".to_string());
    let username = args.next();

    let config = Config::from_env();
    let token = config.bot_token.context("BOT_TOKEN must be set")?;

    let mut user = json!({"id": user_id, "first_name": first_name});
    if let Some(username) = username {
        user["username"] = json!(username);
    }
    let user = user.to_string();

    let auth_date = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?
        .as_secs()
        .to_string();

    let signed = init_data::sign(
        &[
            ("query_id", "local-test"),
            ("user", user.as_str()),
            ("auth_date", auth_date.as_str()),
        ],
        &token,
    );

    println!("{}", signed);

    Ok(())
}
