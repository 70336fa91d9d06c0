//! Email notification channel using SMTP.
//!
//! Every call to [`EmailChannel::send`] opens its own TLS connection to the
//! submission endpoint, authenticates, submits one message and closes the
//! connection again. Nothing is pooled or shared between deliveries.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, warn};

use herald_common::config::AppConfig;
use herald_common::error::AppError;
use herald_common::types::{NotificationMessage, NotificationType};

use crate::channel::{Delivered, DeliveryError, NotificationChannel};

/// Email channel configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server host.
    pub smtp_host: String,
    /// SMTP server port (implicit TLS).
    pub smtp_port: u16,
    /// Service account address, used as both login and `From`.
    pub username: String,
    /// Service account credential.
    pub password: String,
    /// Connection timeout applied to every SMTP command.
    pub timeout: Duration,
}

impl EmailConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.service_account_email.clone(),
            password: config.service_account_password.clone(),
            timeout: Duration::from_secs(config.smtp_timeout_secs),
        }
    }
}

/// Email notification channel.
pub struct EmailChannel {
    config: EmailConfig,
    from: Mailbox,
}

impl EmailChannel {
    /// Create a new email channel. Fails if the service account is not a valid mailbox.
    pub fn new(config: EmailConfig) -> Result<Self, AppError> {
        let from: Mailbox = config.username.parse().map_err(|e| {
            AppError::Config(format!(
                "service account '{}' is not a valid email address: {}",
                config.username, e
            ))
        })?;

        Ok(Self { config, from })
    }

    /// Build the outgoing message for one destination.
    fn build_email(
        &self,
        destination: &str,
        message: &NotificationMessage,
    ) -> Result<Message, DeliveryError> {
        let to: Mailbox = destination
            .parse()
            .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
                destination: destination.to_string(),
                reason: e.to_string(),
            })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| DeliveryError::Build {
                destination: destination.to_string(),
                reason: e.to_string(),
            })
    }

    /// Build a transport that owns exactly one connection for one delivery.
    fn transport(
        &self,
        destination: &str,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| DeliveryError::Transport {
                destination: destination.to_string(),
                reason: e.to_string(),
            })?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(self.config.timeout))
            .build();

        Ok(transport)
    }
}

/// How a failed SMTP exchange is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// The server refused this message or mailbox.
    Rejected,
    /// Connection, TLS, login or timeout trouble; not specific to the recipient.
    Transport,
}

/// Authentication replies (RFC 4954). Permanent, but about the service account.
const AUTH_REPLY_CODES: [u16; 4] = [530, 534, 535, 538];

/// Classify a failure by its SMTP reply code, if the server sent one.
fn classify_failure(code: Option<u16>) -> FailureKind {
    match code {
        Some(code) if AUTH_REPLY_CODES.contains(&code) => FailureKind::Transport,
        Some(500..=599) => FailureKind::Rejected,
        _ => FailureKind::Transport,
    }
}

/// Logs the closing trace when a delivery ends, however it ends.
struct ClosingTrace<'a> {
    destination: &'a str,
}

impl Drop for ClosingTrace<'_> {
    fn drop(&mut self) {
        debug!(destination = self.destination, "Sender closing");
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn notification_type(&self) -> NotificationType {
        NotificationType::Email
    }

    async fn send(
        &self,
        destination: &str,
        message: &NotificationMessage,
    ) -> Result<Delivered, DeliveryError> {
        let _closing = ClosingTrace { destination };

        let email = self.build_email(destination, message)?;
        debug!(
            destination,
            subject = %message.subject,
            smtp_host = %self.config.smtp_host,
            smtp_port = self.config.smtp_port,
            "Sending email"
        );

        let transport = self.transport(destination)?;
        match transport.send(email).await {
            Ok(response) => {
                let detail = response.message().collect::<Vec<_>>().join(" ");
                info!(destination, detail = %detail, "Email delivered");
                Ok(Delivered {
                    destination: destination.to_string(),
                    detail,
                })
            }
            Err(e) => {
                let code = e
                    .status()
                    .and_then(|code| code.to_string().parse::<u16>().ok());
                match classify_failure(code) {
                    FailureKind::Rejected => {
                        warn!(destination, error = %e, "Failed to send: recipient rejected");
                        Err(DeliveryError::Rejected {
                            destination: destination.to_string(),
                            reason: e.to_string(),
                        })
                    }
                    FailureKind::Transport => {
                        error!(destination, error = %e, "Received error while sending");
                        Err(DeliveryError::Transport {
                            destination: destination.to_string(),
                            reason: e.to_string(),
                        })
                    }
                }
            }
        }
    }
}
