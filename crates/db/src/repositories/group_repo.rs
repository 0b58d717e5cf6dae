//! Repository for the `recipient_groups` table.

use sqlx::PgPool;
use tribe_core::types::DbId;

use crate::models::group::RecipientGroup;

/// Column list for `recipient_groups` queries.
const COLUMNS: &str =
    "id, parent_id, name, default_frequency, default_channels, created_at, updated_at";

/// Provides read access to recipient groups.
pub struct GroupRepo;

impl GroupRepo {
    /// Find a group by id.
    pub async fn find(pool: &PgPool, group_id: DbId) -> Result<Option<RecipientGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recipient_groups WHERE id = $1");
        sqlx::query_as::<_, RecipientGroup>(&query)
            .bind(group_id)
            .fetch_optional(pool)
            .await
    }
}
