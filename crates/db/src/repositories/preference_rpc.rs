//! Wrappers over the preference-resolution stored functions.
//!
//! The database owns the actual mute and settings logic (group-scoped vs
//! global mute precedence, the server-side tri-tier fallback, content-type
//! matching). This module only shapes the calls; interpretation of the
//! returned values lives in `tribe-notify`.

use sqlx::PgPool;
use tribe_core::types::DbId;

/// Stored-function call surface for preference resolution.
pub struct PreferenceRpc;

impl PreferenceRpc {
    /// Base mute determination for a recipient, optionally group-scoped.
    pub async fn is_recipient_muted(
        pool: &PgPool,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT is_recipient_muted($1, $2)")
            .bind(recipient_id)
            .bind(group_id)
            .fetch_one(pool)
            .await
    }

    /// Mute-scoped settings bag for a muted recipient. NULL when the mute
    /// carries no settings.
    pub async fn get_mute_settings(
        pool: &PgPool,
        recipient_id: DbId,
        group_id: Option<DbId>,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar("SELECT get_mute_settings($1, $2)")
            .bind(recipient_id)
            .bind(group_id)
            .fetch_one(pool)
            .await
    }

    /// Server-side resolution of the effective notification settings.
    /// NULL when the function has no answer for the membership.
    pub async fn get_effective_settings(
        pool: &PgPool,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar("SELECT get_effective_notification_settings($1, $2)")
            .bind(recipient_id)
            .bind(group_id)
            .fetch_one(pool)
            .await
    }

    /// Combined mute + frequency + content-type eligibility check.
    pub async fn should_deliver(
        pool: &PgPool,
        recipient_id: DbId,
        group_id: DbId,
        notification_type: &str,
        urgency: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT should_deliver_notification($1, $2, $3, $4)")
            .bind(recipient_id)
            .bind(group_id)
            .bind(notification_type)
            .bind(urgency)
            .fetch_one(pool)
            .await
    }
}
