//! Recipient group entity model.

use serde::Serialize;
use sqlx::FromRow;
use tribe_core::types::{DbId, Timestamp};

/// A row from the `recipient_groups` table: a named circle of recipients
/// with group-level notification defaults.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecipientGroup {
    pub id: DbId,
    pub parent_id: DbId,
    pub name: String,
    /// Default notification frequency for members without an override.
    pub default_frequency: String,
    /// Default channel list (jsonb array of channel codes).
    pub default_channels: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
