use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::dto::EmailRequest;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Invalid email address format: {0}")]
    AddressFormat(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),

    #[error("Failed to connect to SMTP relay: {0}")]
    SmtpRelay(lettre::transport::smtp::Error),

    #[error("SMTP send timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Delivery backend, chosen once at startup. `Ok` carries the
/// human-readable confirmation for the response body.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn deliver(&self, request: &EmailRequest) -> Result<String, SendError>;
}

pub struct SmtpSender {
    from_email: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    timeout: Duration,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig, timeout: Duration) -> Result<Self, SendError> {
        let creds = Credentials::new(config.user, config.pass);

        // STARTTLS submission; the relay helper would pin port 465.
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(SendError::SmtpRelay)?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(SmtpSender {
            from_email: config.from_email,
            mailer,
            timeout,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn deliver(&self, request: &EmailRequest) -> Result<String, SendError> {
        let email = Message::builder()
            .from(self.from_email.parse()?)
            .to(request.to.parse()?)
            .subject(request.subject.clone())
            .body(request.body.clone())?;

        tracing::info!(
            "Sending email to '{}' with subject '{}'",
            request.to,
            request.subject
        );

        match tokio::time::timeout(self.timeout, self.mailer.send(email)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => return Err(SendError::Timeout(self.timeout)),
        }

        tracing::info!("Message to {} sent successfully", request.to);

        Ok(format!("Email sent successfully to {}", request.to))
    }
}

/// Fallback used when no SMTP credentials are configured. Simulates a
/// successful send without touching the network.
pub struct MockSender;

#[async_trait]
impl EmailSender for MockSender {
    async fn deliver(&self, request: &EmailRequest) -> Result<String, SendError> {
        tracing::info!(
            "Mock delivery to '{}' with subject '{}'",
            request.to,
            request.subject
        );

        Ok(format!("Mock email sent to {}: {}", request.to, request.subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_sender_formats_confirmation() {
        let request = EmailRequest {
            to: "a@b.com".to_string(),
            subject: "Hi".to_string(),
            body: "test".to_string(),
        };

        let message = MockSender.deliver(&request).await.unwrap();
        assert_eq!(message, "Mock email sent to a@b.com: Hi");
    }
}
