//! Notification channels: email (SMTP) and Telegram.
//!
//! Each channel is a `Notifier`; the `Dispatcher` fans one message out to
//! every configured channel. Channels with missing credentials are simply
//! not constructed. Dispatch failures are logged and reported to the caller,
//! never propagated as panics or loop-stopping errors.

pub mod email;
pub mod telegram;

use crate::config::Config;
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// One delivery channel for operator notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs and `doctor` output.
    fn name(&self) -> &'static str;

    /// Deliver one message.
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Fans a message out to every enabled channel.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Build the channel set from config. Missing credentials disable a
    /// channel silently.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(smtp) = &config.smtp {
            channels.push(Box::new(email::EmailNotifier::new(smtp)?));
        }
        if let Some(tg) = &config.telegram {
            channels.push(Box::new(telegram::TelegramNotifier::new(tg)));
        }
        Ok(Self { channels })
    }

    /// Names of the enabled channels.
    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Send to every channel. Every channel is attempted even when an
    /// earlier one fails; the first failure is returned after the sweep.
    /// With no channels configured this is a successful no-op.
    pub async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut first_err = None;
        for channel in &self.channels {
            if let Err(e) = channel.send(subject, body).await {
                warn!("{} notification failed: {e}", channel.name());
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}
