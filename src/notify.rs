//! Outgoing email notifications, forwarded verbatim to an SMTP relay.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::Config;

/// One notification as received on the wire. No templating, no retries.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub receiver: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: {0:?}")]
    InvalidRecipient(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self> {
        let from: Mailbox = config
            .mail_sender
            .parse()
            .with_context(|| format!("invalid MAIL_SENDER address: {}", config.mail_sender))?;

        let mut builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .with_context(|| format!("failed to create SMTP relay: {}", config.smtp_host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };
        builder = builder.port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let to: Mailbox = email
            .receiver
            .parse()
            .map_err(|_| MailError::InvalidRecipient(email.receiver.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .body(email.body)
            .context("failed to build email message")?;

        self.transport
            .send(message)
            .await
            .context("SMTP submission failed")?;

        info!(receiver = %email.receiver, subject = %email.subject, "notification email sent");
        Ok(())
    }
}
