//! SMTP email channel.

use super::{Notifier, NotifyError};
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sends plain-text mail over an authenticated STARTTLS session.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        let from = parse_mailbox(&config.user)?;
        let to = parse_mailbox(&config.to)?;

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidMessage(format!("bad mail address '{addr}': {e}")))
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| NotifyError::InvalidMessage(e.to_string()))?;

        self.transport.send(message).await?;
        Ok(())
    }
}
