//! Telegram Bot API channel.

use super::{Notifier, NotifyError};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Pushes notifications through the Telegram Bot API as a form-encoded POST.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: API_BASE.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// Point the notifier at a different API host (test servers).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let api_url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let text = format!("{subject}\n{body}");

        let response = self
            .client
            .post(&api_url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text.as_str())])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(NotifyError::SendFailed(format!(
                "Telegram API returned non-success status: {status}. Body: {error_body}"
            )));
        }

        Ok(())
    }
}
