//! Group membership entity model.

use serde::Serialize;
use sqlx::FromRow;
use tribe_core::types::{DbId, Timestamp};

/// A row from the `group_memberships` table: the join between a recipient
/// and a group, carrying optional per-member overrides.
///
/// All override columns are nullable; a null means "fall through to the
/// group default". An absent or past `mute_until` means not muted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupMembership {
    pub id: DbId,
    pub group_id: DbId,
    pub recipient_id: DbId,
    pub notification_frequency: Option<String>,
    /// jsonb array of channel codes.
    pub preferred_channels: Option<serde_json::Value>,
    /// jsonb array of content-type codes.
    pub content_types: Option<serde_json::Value>,
    pub mute_until: Option<Timestamp>,
    /// jsonb bag of mute-scoped settings, e.g. `{"preserve_urgent": false}`.
    pub mute_settings: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
