//! SMTP mail alerts

use super::{Alert, AlertSink};
use crate::error::{RemediationError, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Connection and addressing settings for the mail transport
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: String,
}

/// Sends escalation alerts as mail over STARTTLS
pub struct SmtpAlertSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpAlertSink {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| RemediationError::Configuration(format!("alert_from: {}", e)))?;
        let to: Mailbox = settings
            .to
            .parse()
            .map_err(|e| RemediationError::Configuration(format!("alert_to: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| RemediationError::Configuration(format!("smtp_host: {}", e)))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn message(&self, alert: &Alert) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject())
            .body(alert.body())
            .map_err(|e| RemediationError::AlertDelivery(e.to_string()))
    }
}

#[async_trait]
impl AlertSink for SmtpAlertSink {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let message = self.message(alert)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| RemediationError::AlertDelivery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PodIdentity;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user@example.com".to_string()),
            password: Some("secret".to_string()),
            from: "pod.monitoring@example.com".to_string(),
            to: "alerting@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_configuration_error() {
        let mut settings = settings();
        settings.to = "not an address".to_string();

        let err = SmtpAlertSink::new(&settings).err().unwrap();
        assert!(matches!(err, RemediationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_message_is_built_from_alert() {
        let sink = SmtpAlertSink::new(&settings()).unwrap();
        let alert = Alert::escalation(PodIdentity::new("default", "worker-0"), 4, 3);

        let message = sink.message(&alert).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Kubernetes Pod Failure Alert"));
        assert!(raw.contains("To: alerting@example.com"));
        assert!(raw.contains("worker-0"));
    }
}
