use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Outbound mail transport: accepts (to, subject, html) and reports success or failure.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: Vec<EmailAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

/// Transactional-mail HTTP API client (Brevo `smtp/email` request shape).
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent("nutrisnap-backend/mailer")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.config.sender_address(),
                name: self.config.sender_name.as_deref(),
            },
            to: vec![EmailAddress {
                email: to,
                name: None,
            }],
            subject,
            html_content: html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmailDeliveryError(format!("mail API unreachable: {e}")))?;

        if response.status().is_success() {
            log::info!("Email sent: to={to}");
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::EmailDeliveryError(format!(
                "mail API returned HTTP {}: {}",
                status.as_u16(),
                error_text
            )))
        }
    }
}

/// Picks the transport for `config`: SMTP when a host is configured, the HTTP API otherwise.
pub fn build_mailer(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    if config.uses_smtp() {
        log::info!(
            "Mail transport: SMTP ({}:{})",
            config.smtp_host.as_deref().unwrap_or_default(),
            config.smtp_port
        );
        Ok(Arc::new(super::SmtpMailer::new(config)?))
    } else {
        log::info!("Mail transport: HTTP API ({})", config.api_url);
        Ok(Arc::new(HttpMailer::new(config.clone())?))
    }
}

pub const VERIFICATION_SUBJECT: &str = "Seu Código de Verificação NutriSnap";

pub fn verification_email_html(code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; padding: 20px; color: #333;">
    <h2 style="color: #00C9FF;">Verificação de Email</h2>
    <p>Olá,</p>
    <p>Use o código abaixo para verificar seu email:</p>
    <div style="background-color: #f4f4f4; padding: 15px; border-radius: 8px; text-align: center; margin: 20px 0;">
        <h1 style="color: #00C9FF; margin: 0; font-size: 32px;">{code}</h1>
    </div>
    <p>Este código é válido por <strong>{ttl_minutes} minutos</strong>.</p>
    <p style="margin-top: 30px; font-size: 12px; color: #777;">Atenciosamente,<br>Equipe NutriSnap</p>
</div>"#
    )
}

/// Sends the verification code, bounding the whole dispatch by `timeout`.
/// Any failure, including the timeout, surfaces as `EmailDeliveryError`.
pub async fn send_verification_code(
    mailer: &dyn Mailer,
    to: &str,
    code: &str,
    ttl_minutes: i64,
    timeout: Duration,
) -> AppResult<()> {
    let html = verification_email_html(code, ttl_minutes);
    match tokio::time::timeout(timeout, mailer.send(to, VERIFICATION_SUBJECT, &html)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(AppError::EmailDeliveryError(msg))) => Err(AppError::EmailDeliveryError(msg)),
        Ok(Err(e)) => Err(AppError::EmailDeliveryError(e.to_string())),
        Err(_) => Err(AppError::EmailDeliveryError(format!(
            "mail dispatch timed out after {}s",
            timeout.as_secs()
        ))),
    }
}
