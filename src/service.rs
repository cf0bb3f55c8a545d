use std::sync::Arc;

use chrono::Utc;

use crate::dto::{EmailRequest, EmailResponse};
use crate::sender::{EmailSender, SendError};
use crate::state::Stats;

pub const MAX_BODY_CHARS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("email address is required")]
    MissingTo,

    #[error("subject is required")]
    MissingSubject,

    #[error("message body is required")]
    MissingBody,

    #[error("message body too long (max 10000 characters)")]
    BodyTooLong,
}

#[derive(Debug, thiserror::Error)]
pub enum EmailServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Send(#[from] SendError),
}

pub struct EmailService {
    sender: Box<dyn EmailSender>,
    stats: Arc<Stats>,
}

impl EmailService {
    pub fn new(sender: Box<dyn EmailSender>, stats: Arc<Stats>) -> Self {
        EmailService { sender, stats }
    }

    pub async fn send_email(
        &self,
        request: EmailRequest,
    ) -> Result<EmailResponse, EmailServiceError> {
        validate(&request)?;

        // Counted as soon as the request is accepted, before the outcome is
        // known.
        self.stats.record_accepted(Utc::now());

        match self.sender.deliver(&request).await {
            Ok(message) => {
                self.stats.record_success();
                Ok(EmailResponse {
                    success: true,
                    message,
                    id: Some(generate_email_id()),
                })
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e.into())
            }
        }
    }
}

fn validate(request: &EmailRequest) -> Result<(), ValidationError> {
    if request.to.is_empty() {
        return Err(ValidationError::MissingTo);
    }
    if request.subject.is_empty() {
        return Err(ValidationError::MissingSubject);
    }
    if request.body.is_empty() {
        return Err(ValidationError::MissingBody);
    }
    if request.body.chars().count() > MAX_BODY_CHARS {
        return Err(ValidationError::BodyTooLong);
    }
    Ok(())
}

// Unique with high probability across the process lifetime; nothing more.
fn generate_email_id() -> String {
    format!("email_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::MockSender;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FailingSender;

    #[async_trait]
    impl EmailSender for FailingSender {
        async fn deliver(&self, _request: &EmailRequest) -> Result<String, SendError> {
            Err(SendError::Timeout(Duration::from_secs(30)))
        }
    }

    fn request(to: &str, subject: &str, body: &str) -> EmailRequest {
        EmailRequest {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn validation_reports_first_violation_in_order() {
        assert_eq!(
            validate(&request("", "", "")),
            Err(ValidationError::MissingTo)
        );
        assert_eq!(
            validate(&request("a@b.com", "", "")),
            Err(ValidationError::MissingSubject)
        );
        assert_eq!(
            validate(&request("a@b.com", "Hi", "")),
            Err(ValidationError::MissingBody)
        );
        assert_eq!(
            validate(&request("a@b.com", "Hi", &"x".repeat(10_001))),
            Err(ValidationError::BodyTooLong)
        );
        assert_eq!(validate(&request("a@b.com", "Hi", "test")), Ok(()));
    }

    #[test]
    fn validation_messages_match_wire_format() {
        assert_eq!(
            ValidationError::MissingTo.to_string(),
            "email address is required"
        );
        assert_eq!(
            ValidationError::MissingSubject.to_string(),
            "subject is required"
        );
        assert_eq!(
            ValidationError::MissingBody.to_string(),
            "message body is required"
        );
        assert_eq!(
            ValidationError::BodyTooLong.to_string(),
            "message body too long (max 10000 characters)"
        );
    }

    #[test]
    fn body_limit_counts_characters_not_bytes() {
        // 10,000 multibyte characters are within the limit even though the
        // byte length is far above it.
        let body = "ä".repeat(10_000);
        assert!(body.len() > MAX_BODY_CHARS);
        assert_eq!(validate(&request("a@b.com", "Hi", &body)), Ok(()));
    }

    #[tokio::test]
    async fn mock_dispatch_updates_stats_and_builds_response() {
        let stats = Arc::new(Stats::new());
        let service = EmailService::new(Box::new(MockSender), stats.clone());

        let response = service
            .send_email(request("a@b.com", "Hi", "test"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, "Mock email sent to a@b.com: Hi");
        assert!(response.id.unwrap().starts_with("email_"));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_emails_sent, 1);
        assert_eq!(snapshot.successful_emails, 1);
        assert_eq!(snapshot.failed_emails, 0);
        assert!(snapshot.last_email_sent.is_some());
    }

    #[tokio::test]
    async fn failed_dispatch_still_counts_toward_total() {
        let stats = Arc::new(Stats::new());
        let service = EmailService::new(Box::new(FailingSender), stats.clone());

        let err = service
            .send_email(request("a@b.com", "Hi", "test"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmailServiceError::Send(_)));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_emails_sent, 1);
        assert_eq!(snapshot.successful_emails, 0);
        assert_eq!(snapshot.failed_emails, 1);
    }

    #[tokio::test]
    async fn rejected_request_leaves_stats_untouched() {
        let stats = Arc::new(Stats::new());
        let service = EmailService::new(Box::new(MockSender), stats.clone());

        let err = service.send_email(request("", "Hi", "test")).await.unwrap_err();
        assert!(matches!(
            err,
            EmailServiceError::Validation(ValidationError::MissingTo)
        ));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_emails_sent, 0);
        assert!(snapshot.last_email_sent.is_none());
    }
}
