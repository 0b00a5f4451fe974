/// Outbound mail
///
/// Services send mail through the [`Mailer`] trait. [`SmtpMailer`] delivers
/// over SMTP with `lettre`; [`LogMailer`] only logs, and is used when no
/// SMTP host or sender address is configured.
///
/// # Example
///
/// ```no_run
/// use contacts_shared::mail::{verification_email, Mailer, MailConfig, SmtpMailer};
///
/// # async fn example(config: MailConfig) -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = SmtpMailer::new(&config)?;
/// let email = verification_email("user@example.com", "http://localhost:3000/api/auth/verify/abc");
/// mailer.send(email).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

/// SMTP settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    /// Implicit TLS when true; plaintext otherwise (local relays only)
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_name: String,
    pub from_address: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 465,
            smtp_tls: true,
            smtp_username: None,
            smtp_password: None,
            from_name: "Contacts".to_string(),
            from_address: None,
        }
    }
}

impl MailConfig {
    /// True when both a host and a sender address are set
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some()
    }
}

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP settings are incomplete
    #[error("Mail transport is not configured")]
    NotConfigured,

    /// Sender or recipient is not a valid mailbox
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(String),

    /// The SMTP exchange failed
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// SMTP delivery via `lettre`
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport once; connections are opened per message
    ///
    /// # Errors
    ///
    /// Returns `MailError::NotConfigured` if host or sender are unset, or an
    /// address/transport error if they cannot be parsed
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let (host, address) = match (&config.smtp_host, &config.from_address) {
            (Some(host), Some(address)) => (host, address),
            _ => return Err(MailError::NotConfigured),
        };

        let from = parse_mailbox(&format!("{} <{}>", config.from_name, address))?;

        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        }
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let to = parse_mailbox(&email.to)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");

        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::warn!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "Mail transport not configured, email not sent"
        );
        Ok(())
    }
}

/// SMTP when configured, logging otherwise
///
/// # Errors
///
/// Propagates [`SmtpMailer::new`] failures for a configured but invalid setup
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if config.is_configured() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Renders the address confirmation message
pub fn verification_email(to: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        html: format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Verify your email</title></head>
<body style="font-family: Arial, sans-serif; color: #374151;">
    <p>Thanks for signing up.</p>
    <p>Please confirm your email address by following the link below:</p>
    <p><a target="_blank" href="{link}">Verify email</a></p>
    <p style="color: #6b7280; font-size: 12px;">If you did not create an account, you can ignore this message.</p>
</body>
</html>"#,
            link = link
        ),
        text: format!(
            "Thanks for signing up.\n\nPlease confirm your email address by opening this link:\n{}\n\nIf you did not create an account, you can ignore this message.\n",
            link
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_by_default() {
        let config = MailConfig::default();
        assert!(!config.is_configured());
        assert!(matches!(SmtpMailer::new(&config), Err(MailError::NotConfigured)));
    }

    #[test]
    fn test_invalid_sender_address() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            from_address: Some("not an address".to_string()),
            ..Default::default()
        };

        assert!(matches!(SmtpMailer::new(&config), Err(MailError::InvalidAddress { .. })));
    }

    #[test]
    fn test_verification_email_contains_link() {
        let email = verification_email("user@example.com", "http://x/api/auth/verify/abc");

        assert_eq!(email.to, "user@example.com");
        assert!(email.html.contains(r#"href="http://x/api/auth/verify/abc""#));
        assert!(email.text.contains("http://x/api/auth/verify/abc"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = mailer_from_config(&MailConfig::default()).unwrap();
        let result = mailer.send(verification_email("user@example.com", "link")).await;
        assert!(result.is_ok());
    }
}
