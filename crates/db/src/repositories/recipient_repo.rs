//! Repository for the `recipients` table.

use sqlx::PgPool;
use tribe_core::types::DbId;

use crate::models::recipient::Recipient;

/// Column list for `recipients` queries (aliased for joins).
const COLUMNS: &str = "r.id, r.parent_id, r.name, r.email, r.phone, r.preference_token, \
    r.relationship, r.is_active, r.created_at, r.updated_at";

/// Provides read access to recipients.
pub struct RecipientRepo;

impl RecipientRepo {
    /// List the active recipients of a group, scoped to the owning parent.
    ///
    /// Filters inactive rows on both sides of the membership join, so a
    /// deactivated recipient or a left membership never receives a job.
    pub async fn list_for_group(
        pool: &PgPool,
        group_id: DbId,
        parent_id: DbId,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recipients r \
             JOIN group_memberships m ON m.recipient_id = r.id \
             WHERE m.group_id = $1 AND m.is_active = true \
               AND r.parent_id = $2 AND r.is_active = true \
             ORDER BY r.id"
        );
        sqlx::query_as::<_, Recipient>(&query)
            .bind(group_id)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Find a recipient by id.
    pub async fn find(pool: &PgPool, recipient_id: DbId) -> Result<Option<Recipient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipients r WHERE r.id = $1");
        sqlx::query_as::<_, Recipient>(&query)
            .bind(recipient_id)
            .fetch_optional(pool)
            .await
    }
}
