//! Recipient entity model.

use serde::Serialize;
use sqlx::FromRow;
use tribe_core::channels::DeliveryChannel;
use tribe_core::types::{DbId, Timestamp};

/// A row from the `recipients` table: one person who receives a parent's
/// updates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipient {
    pub id: DbId,
    /// The account that owns this recipient.
    pub parent_id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Opaque token for unauthenticated preference-management links.
    pub preference_token: String,
    /// Relationship category, e.g. `grandparent`, `friend`.
    pub relationship: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Recipient {
    /// Whether this recipient has an address usable on the given channel.
    pub fn can_receive(&self, channel: DeliveryChannel) -> bool {
        let address = if channel.requires_phone() {
            self.phone.as_deref()
        } else {
            self.email.as_deref()
        };
        address.is_some_and(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn recipient(email: Option<&str>, phone: Option<&str>) -> Recipient {
        Recipient {
            id: 1,
            parent_id: 1,
            name: "Grandma Rose".to_string(),
            email: email.map(String::from),
            phone: phone.map(String::from),
            preference_token: "tok".to_string(),
            relationship: "grandparent".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn email_channel_needs_an_email_address() {
        assert!(recipient(Some("rose@example.com"), None).can_receive(DeliveryChannel::Email));
        assert!(!recipient(None, Some("+15550001")).can_receive(DeliveryChannel::Email));
        assert!(!recipient(Some(""), None).can_receive(DeliveryChannel::Email));
    }

    #[test]
    fn phone_channels_need_a_phone_number() {
        let phone_only = recipient(None, Some("+15550001"));
        assert!(phone_only.can_receive(DeliveryChannel::Sms));
        assert!(phone_only.can_receive(DeliveryChannel::WhatsApp));

        let email_only = recipient(Some("rose@example.com"), None);
        assert!(!email_only.can_receive(DeliveryChannel::Sms));
        assert!(!email_only.can_receive(DeliveryChannel::WhatsApp));
    }
}
