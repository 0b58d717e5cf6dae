//! Mute resolution with the urgent-override rule.

use std::sync::Arc;

use tribe_core::notifications::UrgencyLevel;
use tribe_core::policy::DegradationPolicy;
use tribe_core::types::DbId;

use crate::authority::PreferenceAuthority;

/// Resolves whether a recipient is currently muted for delivery purposes.
pub struct MuteResolver {
    authority: Arc<dyn PreferenceAuthority>,
    policy: DegradationPolicy,
}

impl MuteResolver {
    pub fn new(authority: Arc<dyn PreferenceAuthority>, policy: DegradationPolicy) -> Self {
        Self { authority, policy }
    }

    /// Whether the recipient is muted, after the urgent override.
    ///
    /// Urgent updates break through an active mute unless the recipient
    /// disabled `preserve_urgent` on the mute. When the authority is
    /// unreachable the injected [`DegradationPolicy`] answers instead;
    /// the default bias treats the recipient as not muted so an
    /// infrastructure blip never drops an update.
    pub async fn is_recipient_muted(
        &self,
        recipient_id: DbId,
        group_id: Option<DbId>,
        urgency: UrgencyLevel,
    ) -> bool {
        let muted = match self.authority.is_muted(recipient_id, group_id).await {
            Ok(muted) => muted,
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    error = %e,
                    "Mute check unavailable, applying degradation policy"
                );
                return self.policy.assume_muted();
            }
        };

        if !muted {
            return false;
        }
        if urgency != UrgencyLevel::Urgent {
            return true;
        }

        match self.authority.mute_settings(recipient_id, group_id).await {
            // preserve_urgent means urgent traffic still goes out.
            Ok(settings) => !settings.preserve_urgent,
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    error = %e,
                    "Mute settings unavailable, applying degradation policy"
                );
                self.policy.assume_muted()
            }
        }
    }
}
