//! SMTP delivery, or a logging stand-in when SMTP is not configured.

use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::notify::{templates::EmailContent, NotifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Mock mode: the message was logged, not sent.
    Logged,
}

pub enum Mailer {
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
    Mock {
        from: String,
    },
}

impl Mailer {
    pub fn from_config(mail: &MailConfig) -> Result<Self, NotifyError> {
        let Some(smtp) = &mail.smtp else {
            tracing::info!("SMTP not configured, emails will be logged only");
            return Ok(Self::mock(mail));
        };
        let address: Address = mail.from_address.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
            .build();
        tracing::info!(host = %smtp.host, port = smtp.port, "SMTP mailer ready");
        Ok(Self::Smtp {
            transport,
            from: Mailbox::new(Some(mail.app_name.clone()), address),
        })
    }

    /// Like `from_config`, but a bad mail setting degrades to mock mode instead of an error.
    pub fn from_config_or_mock(mail: &MailConfig) -> Self {
        Self::from_config(mail).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "SMTP mailer unavailable, emails will be logged only");
            Self::mock(mail)
        })
    }

    pub fn mock(mail: &MailConfig) -> Self {
        Self::Mock { from: format!("{} <{}>", mail.app_name, mail.from_address) }
    }

    pub fn is_mock(&self) -> bool { matches!(self, Self::Mock { .. }) }

    pub async fn send(&self, to: &str, email: &EmailContent) -> Result<Delivery, NotifyError> {
        let recipient: Mailbox = to.parse()?;
        match self {
            Self::Mock { from } => {
                tracing::info!(%from, to = %recipient, subject = %email.subject, "mock email");
                Ok(Delivery::Logged)
            }
            Self::Smtp { transport, from } => {
                let message = Message::builder()
                    .from(from.clone())
                    .to(recipient)
                    .subject(email.subject.clone())
                    .multipart(MultiPart::alternative_plain_html(email.text.clone(), email.html.clone()))?;
                transport.send(message).await?;
                tracing::info!(to, subject = %email.subject, "email sent");
                Ok(Delivery::Sent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn content() -> EmailContent {
        EmailContent { subject: "Hi".into(), html: "<p>Hi</p>".into(), text: "Hi".into() }
    }

    #[tokio::test]
    async fn missing_smtp_selects_mock_mode() {
        let mailer = Mailer::from_config(&MailConfig::default()).unwrap();
        assert!(mailer.is_mock());
        assert_eq!(mailer.send("buyer@example.com", &content()).await.unwrap(), Delivery::Logged);
    }

    #[test]
    fn invalid_sender_with_smtp_falls_back_to_mock() {
        let mail = MailConfig {
            smtp: Some(SmtpConfig {
                host: "smtp.example.com".into(),
                port: 587,
                username: "mailer".into(),
                password: "secret".into(),
            }),
            from_address: "not an address".into(),
            ..MailConfig::default()
        };
        assert!(matches!(Mailer::from_config(&mail), Err(NotifyError::Address(_))));
        assert!(Mailer::from_config_or_mock(&mail).is_mock());
    }

    #[tokio::test]
    async fn bad_recipient_is_an_error_even_in_mock_mode() {
        let mailer = Mailer::mock(&MailConfig::default());
        assert!(matches!(mailer.send("not an address", &content()).await, Err(NotifyError::Address(_))));
    }
}
