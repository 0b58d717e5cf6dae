//! Outbound channel transports.
//!
//! Each channel the engine can deliver on implements [`ChannelTransport`];
//! the batch processor looks transports up in a [`TransportRegistry`] by
//! the job's channel. Email goes out over SMTP ([`email`]), SMS and
//! WhatsApp through a Twilio-style messaging API ([`twilio`]).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tribe_core::channels::DeliveryChannel;
use tribe_db::models::{NotificationJob, Recipient};

pub mod email;
pub mod twilio;

pub use email::{EmailConfig, EmailTransport};
pub use twilio::{SmsTransport, TwilioClient, TwilioConfig, WhatsAppTransport};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for delivery failures across all transports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender email address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The messaging provider rejected the request.
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// The recipient address is unusable on this channel.
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),
}

// ---------------------------------------------------------------------------
// Request / receipt
// ---------------------------------------------------------------------------

/// A rendered message bound for one recipient address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    /// Email address or phone number, depending on the channel.
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Opaque token for unauthenticated preference-management links.
    pub preference_token: String,
}

impl DeliveryRequest {
    /// Build the request for one claimed job, pulling the address off the
    /// recipient row and the rendered update out of the job payload.
    pub fn for_job(
        job: &NotificationJob,
        recipient: &Recipient,
        channel: DeliveryChannel,
    ) -> Result<Self, String> {
        let to = if channel.requires_phone() {
            recipient
                .phone
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| "recipient has no phone number".to_string())?
        } else {
            recipient
                .email
                .as_deref()
                .filter(|e| !e.is_empty())
                .ok_or_else(|| "recipient has no email address".to_string())?
        };

        let update = job.content.get("update");
        let subject = update
            .and_then(|u| u.get("subject"))
            .and_then(|s| s.as_str())
            .unwrap_or("New update")
            .to_string();
        let body = update
            .and_then(|u| u.get("body"))
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            to: to.to_string(),
            subject,
            body,
            preference_token: recipient.preference_token.clone(),
        })
    }
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReceipt {
    pub provider_message_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Transport trait and registry
// ---------------------------------------------------------------------------

/// One outbound channel integration.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// The channel this transport serves.
    fn channel(&self) -> DeliveryChannel;

    /// Send one message, returning the provider acknowledgement.
    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, TransportError>;
}

/// Registered transports keyed by channel.
#[derive(Default)]
pub struct TransportRegistry {
    transports: HashMap<DeliveryChannel, Arc<dyn ChannelTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport, replacing any previous one for its channel.
    pub fn register(&mut self, transport: Arc<dyn ChannelTransport>) {
        self.transports.insert(transport.channel(), transport);
    }

    /// The transport serving `channel`, if one is registered.
    pub fn get(&self, channel: DeliveryChannel) -> Option<&Arc<dyn ChannelTransport>> {
        self.transports.get(&channel)
    }

    /// Channels with a registered transport.
    pub fn channels(&self) -> Vec<DeliveryChannel> {
        self.transports.keys().copied().collect()
    }
}
