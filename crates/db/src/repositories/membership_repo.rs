//! Repository for the `group_memberships` table.

use sqlx::PgPool;
use tribe_core::types::DbId;

use crate::models::membership::GroupMembership;

/// Column list for `group_memberships` queries.
const COLUMNS: &str = "id, group_id, recipient_id, notification_frequency, preferred_channels, \
    content_types, mute_until, mute_settings, is_active, created_at, updated_at";

/// Provides read access to group memberships.
pub struct MembershipRepo;

impl MembershipRepo {
    /// Find the membership joining a recipient to a group.
    pub async fn find(
        pool: &PgPool,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<GroupMembership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM group_memberships \
             WHERE recipient_id = $1 AND group_id = $2"
        );
        sqlx::query_as::<_, GroupMembership>(&query)
            .bind(recipient_id)
            .bind(group_id)
            .fetch_optional(pool)
            .await
    }
}
