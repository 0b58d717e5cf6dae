//! SMS and WhatsApp delivery through a Twilio-style messaging API.
//!
//! Both channels share one [`TwilioClient`]: a message create is a
//! form-encoded POST authenticated with the account SID and auth token,
//! answered with a JSON body whose `sid` identifies the accepted message.
//! WhatsApp uses the same endpoint with `whatsapp:`-prefixed numbers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tribe_core::channels::DeliveryChannel;
use tribe_core::contact::{is_plausible_phone, normalize_phone};

use super::{ChannelTransport, DeliveryReceipt, DeliveryRequest, TransportError};

/// HTTP request timeout for a single message create.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default API origin; overridable for self-hosted gateways and tests.
const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

// ---------------------------------------------------------------------------
// TwilioConfig
// ---------------------------------------------------------------------------

/// Configuration for the messaging API.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub api_base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number for SMS.
    pub sms_from: String,
    /// Sender number for WhatsApp; falls back to `sms_from`.
    pub whatsapp_from: Option<String>,
}

impl TwilioConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `TWILIO_ACCOUNT_SID` is not set, signalling that
    /// SMS/WhatsApp delivery is not configured and should be skipped.
    ///
    /// | Variable               | Required | Default                  |
    /// |------------------------|----------|--------------------------|
    /// | `TWILIO_ACCOUNT_SID`   | yes      |                          |
    /// | `TWILIO_AUTH_TOKEN`    | yes      |                          |
    /// | `TWILIO_SMS_FROM`      | yes      |                          |
    /// | `TWILIO_WHATSAPP_FROM` | no       | value of `TWILIO_SMS_FROM` |
    /// | `TWILIO_API_BASE_URL`  | no       | `https://api.twilio.com` |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            sms_from: std::env::var("TWILIO_SMS_FROM").ok()?,
            whatsapp_from: std::env::var("TWILIO_WHATSAPP_FROM").ok(),
            api_base_url: std::env::var("TWILIO_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// TwilioClient
// ---------------------------------------------------------------------------

/// Shared REST client for the messaging API.
pub struct TwilioClient {
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// POST one message create; returns the provider message sid.
    async fn send_message(
        &self,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<String, TransportError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base_url, self.config.account_sid
        );
        let params = [("From", from), ("To", to), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response.json().await?;
        Ok(payload
            .get("sid")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

/// Normalize and shape-check a phone number before calling the provider.
fn usable_number(raw: &str) -> Result<String, TransportError> {
    let normalized = normalize_phone(raw);
    if !is_plausible_phone(&normalized) {
        return Err(TransportError::InvalidAddress(raw.to_string()));
    }
    Ok(normalized)
}

/// SMS bodies have no subject line of their own.
fn sms_body(request: &DeliveryRequest) -> String {
    format!("{}\n{}", request.subject, request.body)
}

// ---------------------------------------------------------------------------
// SmsTransport
// ---------------------------------------------------------------------------

/// Sends update notifications as text messages.
pub struct SmsTransport {
    client: Arc<TwilioClient>,
}

impl SmsTransport {
    pub fn new(client: Arc<TwilioClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelTransport for SmsTransport {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, TransportError> {
        let to = usable_number(&request.to)?;
        let sid = self
            .client
            .send_message(&self.client.config.sms_from, &to, &sms_body(request))
            .await?;

        tracing::info!(to = %to, sid = %sid, "Notification SMS sent");
        Ok(DeliveryReceipt {
            provider_message_id: Some(sid),
        })
    }
}

// ---------------------------------------------------------------------------
// WhatsAppTransport
// ---------------------------------------------------------------------------

/// Sends update notifications over WhatsApp.
pub struct WhatsAppTransport {
    client: Arc<TwilioClient>,
}

impl WhatsAppTransport {
    pub fn new(client: Arc<TwilioClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelTransport for WhatsAppTransport {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::WhatsApp
    }

    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, TransportError> {
        let to = usable_number(&request.to)?;
        let config = &self.client.config;
        let from = config.whatsapp_from.as_deref().unwrap_or(&config.sms_from);

        let sid = self
            .client
            .send_message(
                &format!("whatsapp:{from}"),
                &format!("whatsapp:{to}"),
                &sms_body(request),
            )
            .await?;

        tracing::info!(to = %to, sid = %sid, "Notification WhatsApp message sent");
        Ok(DeliveryReceipt {
            provider_message_id: Some(sid),
        })
    }
}
