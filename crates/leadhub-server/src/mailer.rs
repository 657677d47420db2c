//! Outbound email over SMTP.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use leadhub_core::error::LeadHubError;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `LeadHub <no-reply@example.com>`.
    pub from: String,
}

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_url: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig, frontend_url: String) -> Result<Self, LeadHubError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| LeadHubError::Email(format!("invalid from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| LeadHubError::Email(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            frontend_url,
        })
    }

    /// Send the password-reset message carrying the raw reset token.
    pub async fn send_password_reset(
        &self,
        to: &str,
        raw_token: &str,
    ) -> Result<(), LeadHubError> {
        let reset_url = format!("{}/reset-password/{}", self.frontend_url, raw_token);
        let body = format!(
            "Hello,\n\n\
             You have requested to reset your LeadHub password.\n\n\
             Open the link below to choose a new password:\n\
             {reset_url}\n\n\
             This link expires in 10 minutes. If you did not request a \
             password reset, you can safely ignore this email.\n\n\
             LeadHub",
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| LeadHubError::Email(format!("invalid recipient: {e}")))?)
            .subject("Password Reset Request - LeadHub")
            .body(body)
            .map_err(|e| LeadHubError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| LeadHubError::Email(e.to_string()))?;

        Ok(())
    }
}
