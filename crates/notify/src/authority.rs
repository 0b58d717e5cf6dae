//! The preference authority seam.
//!
//! The database owns mute precedence, the server-side settings fallback
//! and the combined eligibility check; [`PreferenceAuthority`] is the
//! engine's view of it. [`PgPreferenceAuthority`] is the production
//! implementation over the stored functions; tests inject in-memory
//! stand-ins.

use async_trait::async_trait;
use tribe_core::notifications::{EffectiveSettings, MuteSettings, NotificationType, UrgencyLevel};
use tribe_core::types::DbId;
use tribe_db::repositories::PreferenceRpc;
use tribe_db::DbPool;

use crate::error::AuthorityError;

/// External authority for mute state and notification preferences.
#[async_trait]
pub trait PreferenceAuthority: Send + Sync {
    /// Base mute determination for a recipient, optionally group-scoped.
    /// Precedence between a group mute and a global mute is the
    /// authority's business.
    async fn is_muted(
        &self,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<bool, AuthorityError>;

    /// Mute-scoped settings for a muted recipient. A mute without
    /// explicit settings resolves to the defaults.
    async fn mute_settings(
        &self,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<MuteSettings, AuthorityError>;

    /// Fully-resolved notification settings, computed server-side.
    /// `None` when the authority has no answer for this membership.
    async fn effective_settings(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<EffectiveSettings>, AuthorityError>;

    /// Combined mute + frequency + content-type eligibility check.
    async fn should_deliver(
        &self,
        recipient_id: DbId,
        group_id: DbId,
        notification_type: NotificationType,
        urgency: UrgencyLevel,
    ) -> Result<bool, AuthorityError>;
}

/// Stored-function-backed authority.
pub struct PgPreferenceAuthority {
    pool: DbPool,
}

impl PgPreferenceAuthority {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceAuthority for PgPreferenceAuthority {
    async fn is_muted(
        &self,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<bool, AuthorityError> {
        Ok(PreferenceRpc::is_recipient_muted(&self.pool, recipient_id, group_id).await?)
    }

    async fn mute_settings(
        &self,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<MuteSettings, AuthorityError> {
        let value = PreferenceRpc::get_mute_settings(&self.pool, recipient_id, group_id).await?;
        Ok(value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    async fn effective_settings(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<EffectiveSettings>, AuthorityError> {
        let value =
            PreferenceRpc::get_effective_settings(&self.pool, recipient_id, group_id).await?;
        let Some(value) = value else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(settings) => Ok(Some(settings)),
            Err(e) => {
                // A malformed payload is treated like no answer; the
                // resolver's manual fallback takes over.
                tracing::warn!(
                    recipient_id,
                    group_id,
                    error = %e,
                    "Discarding malformed effective-settings payload"
                );
                Ok(None)
            }
        }
    }

    async fn should_deliver(
        &self,
        recipient_id: DbId,
        group_id: DbId,
        notification_type: NotificationType,
        urgency: UrgencyLevel,
    ) -> Result<bool, AuthorityError> {
        Ok(PreferenceRpc::should_deliver(
            &self.pool,
            recipient_id,
            group_id,
            notification_type.as_str(),
            urgency.as_str(),
        )
        .await?)
    }
}
