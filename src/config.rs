//! Environment-derived configuration, loaded once at startup.
//!
//! The config surface is a `.env` file (or plain process environment):
//! one `WATCH_URL_<NAME>` entry per monitored location, interval knobs,
//! and optional notifier credentials. Missing credentials disable that
//! notifier only; missing targets are a fatal startup error.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
const DEFAULT_HEARTBEAT_SECS: u64 = 1800;
const DEFAULT_COOLDOWN_SECS: u64 = 600;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SESSION_DIR: &str = "session_profile";
const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

/// One monitored location. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub url: String,
}

/// SMTP credentials for the email notifier.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub to: String,
}

/// Telegram Bot API credentials for the chat notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Process-wide configuration, read once before the loop starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub targets: Vec<Target>,
    pub check_interval: Duration,
    pub heartbeat_interval: Duration,
    pub cooldown: Duration,
    pub session_dir: PathBuf,
    pub artifact_dir: PathBuf,
    pub smtp: Option<SmtpConfig>,
    pub telegram: Option<TelegramConfig>,
    pub extra_negative_phrases: Vec<String>,
    pub login_url: Option<String>,
}

impl Config {
    /// Load from the process environment (after `dotenv` has run).
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build a config from explicit key/value pairs.
    pub fn from_vars(vars: impl Iterator<Item = (String, String)>) -> Result<Self> {
        let map: HashMap<String, String> = vars
            .map(|(k, v)| (k, v.trim().to_string()))
            .collect();

        let mut targets = Vec::new();
        for (key, value) in &map {
            if let Some(suffix) = key.strip_prefix("WATCH_URL_") {
                if suffix.is_empty() || value.is_empty() {
                    continue;
                }
                Url::parse(value)
                    .with_context(|| format!("{key} is not a valid URL: {value}"))?;
                targets.push(Target {
                    name: suffix.to_uppercase(),
                    url: value.clone(),
                });
            }
        }
        if targets.is_empty() {
            bail!(
                "no targets configured. Set at least one WATCH_URL_<NAME> entry \
                 in the environment or .env file (e.g. WATCH_URL_BOSTON=https://...)."
            );
        }
        // Deterministic cycle order regardless of env iteration order.
        targets.sort_by(|a, b| a.name.cmp(&b.name));

        let smtp = match (
            non_empty(&map, "SMTP_HOST"),
            non_empty(&map, "SMTP_USER"),
            non_empty(&map, "SMTP_PASS"),
            non_empty(&map, "MAIL_TO"),
        ) {
            (Some(host), Some(user), Some(pass), Some(to)) => Some(SmtpConfig {
                host,
                port: read_u16(&map, "SMTP_PORT", DEFAULT_SMTP_PORT),
                user,
                pass,
                to,
            }),
            _ => None,
        };

        let telegram = match (
            non_empty(&map, "TELEGRAM_BOT_TOKEN"),
            non_empty(&map, "TELEGRAM_CHAT_ID"),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        let extra_negative_phrases = map
            .get("WATCH_NEGATIVE_PHRASES")
            .map(|raw| {
                raw.split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            targets,
            check_interval: Duration::from_secs(read_u64(
                &map,
                "CHECK_INTERVAL_SECONDS",
                DEFAULT_CHECK_INTERVAL_SECS,
            )),
            heartbeat_interval: Duration::from_secs(read_u64(
                &map,
                "STATUS_REPORT_SECONDS",
                DEFAULT_HEARTBEAT_SECS,
            )),
            cooldown: Duration::from_secs(read_u64(
                &map,
                "COOLDOWN_SECONDS",
                DEFAULT_COOLDOWN_SECS,
            )),
            session_dir: PathBuf::from(
                non_empty(&map, "SESSION_DIR").unwrap_or_else(|| DEFAULT_SESSION_DIR.to_string()),
            ),
            artifact_dir: PathBuf::from(
                non_empty(&map, "ARTIFACT_DIR")
                    .unwrap_or_else(|| DEFAULT_ARTIFACT_DIR.to_string()),
            ),
            smtp,
            telegram,
            extra_negative_phrases,
            login_url: non_empty(&map, "LOGIN_URL"),
        })
    }

    /// The session profile must exist before `watch` can run; `slotwatch login`
    /// creates it on first use.
    pub fn ensure_session_dir(&self) -> Result<()> {
        if !self.session_dir.exists() {
            bail!(
                "session directory '{}' not found. Run `slotwatch login` once to \
                 sign in and create the browser profile.",
                self.session_dir.display()
            );
        }
        Ok(())
    }
}

fn non_empty(map: &HashMap<String, String>, name: &str) -> Option<String> {
    map.get(name).filter(|v| !v.is_empty()).cloned()
}

fn read_u64(map: &HashMap<String, String>, name: &str, default_value: u64) -> u64 {
    map.get(name)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_u16(map: &HashMap<String, String>, name: &str, default_value: u16) -> u16 {
    map.get(name)
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(default_value)
}
