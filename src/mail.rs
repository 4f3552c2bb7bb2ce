//! Outbound mail: one authenticated SMTPS session per digest.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Abstraction over digest delivery.
/// Implemented by `SmtpNotifier` for production; `StdoutNotifier` backs
/// `--dry-run`, and mock implementations are used in tests.
pub trait DigestSender {
    async fn send(&self, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct SmtpNotifier {
    host: String,
    port: u16,
    sender_email: String,
    sender_name: Option<String>,
    password: String,
    recipients: Vec<String>,
}

impl SmtpNotifier {
    pub fn new(
        host: &str,
        port: u16,
        sender_email: &str,
        sender_name: Option<&str>,
        password: &str,
        recipients: &[String],
    ) -> Self {
        Self {
            host: host.to_string(),
            port,
            sender_email: sender_email.to_string(),
            sender_name: sender_name.map(str::to_string),
            password: password.to_string(),
            recipients: recipients.to_vec(),
        }
    }
}

impl DigestSender for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), MailError> {
        let message = build_message(
            &self.sender_email,
            self.sender_name.as_deref(),
            &self.recipients,
            subject,
            body,
        )?;

        let credentials =
            Credentials::new(self.sender_email.clone(), self.password.clone());
        // relay() speaks implicit TLS (SMTPS); the configured port
        // overrides the default submissions port.
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
            .port(self.port)
            .credentials(credentials)
            .build();

        let response = mailer.send(message).await?;
        info!(code = %response.code(), recipients = self.recipients.len(), "digest sent");
        Ok(())
    }
}

/// Single plain-text UTF-8 message; every recipient appears in the `To`
/// header and as an envelope recipient.
fn build_message(
    sender_email: &str,
    sender_name: Option<&str>,
    recipients: &[String],
    subject: &str,
    body: &str,
) -> Result<Message, MailError> {
    let sender: Address = sender_email.trim().parse()?;
    let from = Mailbox::new(sender_name.map(str::to_string), sender);

    let mut builder = Message::builder().from(from).subject(subject);
    for recipient in recipients {
        let address: Address = recipient.trim().parse()?;
        builder = builder.to(Mailbox::new(None, address));
    }

    Ok(builder.body(body.to_string())?)
}

/// Prints the digest instead of mailing it.
pub struct StdoutNotifier;

impl DigestSender for StdoutNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), MailError> {
        println!("Subject: {subject}\n\n{body}");
        Ok(())
    }
}
