//! Outbound email.
//!
//! Everything that sends mail goes through the [`Mailer`] trait so the
//! handlers stay agnostic of the transport: SMTP in production, a logging
//! sink when SMTP is unconfigured, and an in-memory outbox in tests.

mod smtp;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("failed to send email: {0}")]
    SendFailed(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("invalid mail configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// Fallback when no SMTP transport is configured: log and drop.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), EmailError> {
        tracing::info!(to, subject, "email delivery disabled, dropping message");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Test double mirroring a mail outbox: sent messages are captured for
/// assertions instead of being delivered.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMailer {
    outbox: std::sync::Mutex<Vec<OutboundEmail>>,
}

#[cfg(test)]
impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.outbox.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        self.outbox.lock().unwrap().push(OutboundEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
