//! Delivery channels a recipient can receive update notifications on.
//!
//! Channel values are stored as strings in the `notification_jobs.channel`
//! column and in the jsonb channel lists on groups and memberships; the
//! string codes here must match what the preference UI writes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An outbound delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryChannel {
    /// SMTP email.
    #[serde(rename = "email")]
    Email,
    /// Text message to the recipient's phone number.
    #[serde(rename = "sms")]
    Sms,
    /// WhatsApp message to the recipient's phone number.
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

impl DeliveryChannel {
    /// String code for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Email => "email",
            DeliveryChannel::Sms => "sms",
            DeliveryChannel::WhatsApp => "whatsapp",
        }
    }

    /// Parse a stored string code. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(DeliveryChannel::Email),
            "sms" => Some(DeliveryChannel::Sms),
            "whatsapp" => Some(DeliveryChannel::WhatsApp),
            _ => None,
        }
    }

    /// Whether this channel delivers to a phone number.
    pub fn requires_phone(&self) -> bool {
        matches!(self, DeliveryChannel::Sms | DeliveryChannel::WhatsApp)
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
