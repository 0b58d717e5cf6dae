//! The delivery-eligibility gate.

use std::sync::Arc;

use tribe_core::notifications::{NotificationType, UrgencyLevel};
use tribe_core::policy::DegradationPolicy;
use tribe_core::types::DbId;

use crate::authority::PreferenceAuthority;

/// Single combined check of mute state, frequency preference and
/// content-type matching, evaluated by the authority.
pub struct DeliveryGate {
    authority: Arc<dyn PreferenceAuthority>,
    policy: DegradationPolicy,
}

impl DeliveryGate {
    pub fn new(authority: Arc<dyn PreferenceAuthority>, policy: DegradationPolicy) -> Self {
        Self { authority, policy }
    }

    /// Whether a notification should go to this recipient right now.
    ///
    /// Consulted both at job creation and again at delivery time, since
    /// mute state and settings can change in between. Authority outages
    /// are answered by the injected [`DegradationPolicy`].
    pub async fn should_deliver(
        &self,
        recipient_id: DbId,
        group_id: DbId,
        notification_type: NotificationType,
        urgency: UrgencyLevel,
    ) -> bool {
        match self
            .authority
            .should_deliver(recipient_id, group_id, notification_type, urgency)
            .await
        {
            Ok(deliver) => deliver,
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    group_id,
                    error = %e,
                    "Eligibility check unavailable, applying degradation policy"
                );
                self.policy.assume_deliverable()
            }
        }
    }
}
