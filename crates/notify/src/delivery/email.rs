//! Email delivery via SMTP.
//!
//! [`EmailTransport`] sends plain-text update notifications through the
//! `lettre` async SMTP transport. Configuration comes from environment
//! variables; when `SMTP_HOST` is not set, [`EmailConfig::from_env`]
//! returns `None` and the email channel stays unregistered.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tribe_core::channels::DeliveryChannel;

use super::{ChannelTransport, DeliveryReceipt, DeliveryRequest, TransportError};

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "updates@tribe.family";

/// Default base URL for preference-management links.
const DEFAULT_PREFERENCE_BASE_URL: &str = "https://tribe.family";

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMTP email transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Base URL the preference-token footer links point at.
    pub preference_base_url: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable              | Required | Default                  |
    /// |-----------------------|----------|--------------------------|
    /// | `SMTP_HOST`           | yes      |                          |
    /// | `SMTP_PORT`           | no       | `587`                    |
    /// | `SMTP_FROM`           | no       | `updates@tribe.family`   |
    /// | `SMTP_USER`           | no       |                          |
    /// | `SMTP_PASSWORD`       | no       |                          |
    /// | `PREFERENCE_BASE_URL` | no       | `https://tribe.family`   |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            preference_base_url: std::env::var("PREFERENCE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PREFERENCE_BASE_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailTransport
// ---------------------------------------------------------------------------

/// Sends update notification emails via SMTP.
pub struct EmailTransport {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailTransport {
    /// Build the SMTP relay once; reused for every send.
    pub fn new(config: EmailConfig) -> Result<Self, TransportError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            config,
        })
    }

    /// Body text plus the preference-management footer every email gets.
    fn render_body(&self, request: &DeliveryRequest) -> String {
        format!(
            "{}\n\n--\nManage how you receive these updates: {}/preferences/{}",
            request.body, self.config.preference_base_url, request.preference_token
        )
    }
}

#[async_trait]
impl ChannelTransport for EmailTransport {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, TransportError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(request.to.parse()?)
            .subject(request.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(self.render_body(request))
            .map_err(|e| TransportError::Build(e.to_string()))?;

        self.mailer.send(email).await?;

        tracing::info!(to = %request.to, subject = %request.subject, "Notification email sent");
        Ok(DeliveryReceipt::default())
    }
}
