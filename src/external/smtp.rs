use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use crate::external::Mailer;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Mail over an SMTP relay (host, port, username, password).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::InternalError("mail.smtp_host is not set".to_string()))?;

        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| AppError::InternalError(format!("invalid SMTP relay {host}: {e}")))?;

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let address: Address = config.sender_address().parse().map_err(|e| {
            AppError::InternalError(format!(
                "invalid sender address {:?}: {e}",
                config.sender_address()
            ))
        })?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(config.sender_name.clone(), address),
        })
    }

    fn message(&self, to: &str, subject: &str, html: &str) -> AppResult<Message> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::EmailDeliveryError(format!("invalid recipient {to}: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| AppError::EmailDeliveryError(format!("cannot build message: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let message = self.message(to, subject, html)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::EmailDeliveryError(format!("SMTP send failed: {e}")))?;

        log::info!("Email sent via SMTP: to={to}");
        Ok(())
    }
}
