//! The job store seam.
//!
//! Everything the engine reads and writes outside the preference
//! authority goes through [`JobStore`]: recipient rows for fan-out and
//! addressing, membership/group rows for the manual settings fallback,
//! and the notification-job lifecycle. [`PgJobStore`] delegates to the
//! `tribe-db` repositories.

use async_trait::async_trait;
use tribe_core::types::{DbId, Timestamp};
use tribe_db::models::{
    GroupMembership, JobStatusRow, NewNotificationJob, NotificationJob, Recipient, RecipientGroup,
};
use tribe_db::repositories::{
    GroupRepo, MembershipRepo, NotificationJobRepo, RecipientRepo,
};
use tribe_db::DbPool;

use crate::error::StoreError;

/// Persistence surface for the notification engine.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Active recipients of a group, scoped to the owning parent.
    async fn group_recipients(
        &self,
        group_id: DbId,
        parent_id: DbId,
    ) -> Result<Vec<Recipient>, StoreError>;

    /// One recipient by id (fresh contact info at delivery time).
    async fn recipient(&self, recipient_id: DbId) -> Result<Option<Recipient>, StoreError>;

    /// The membership joining a recipient to a group.
    async fn membership(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<GroupMembership>, StoreError>;

    /// One group by id.
    async fn group(&self, group_id: DbId) -> Result<Option<RecipientGroup>, StoreError>;

    /// Insert a generation pass's jobs, all-or-nothing.
    async fn insert_jobs(
        &self,
        jobs: &[NewNotificationJob],
    ) -> Result<Vec<NotificationJob>, StoreError>;

    /// Atomically claim up to `limit` due jobs into `processing`.
    async fn claim_due_jobs(&self, limit: i64) -> Result<Vec<NotificationJob>, StoreError>;

    /// Terminal transition: delivered.
    async fn mark_sent(
        &self,
        job_id: DbId,
        provider_message_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Terminal transition: rejected by re-validation.
    async fn mark_skipped(&self, job_id: DbId, reason: &str) -> Result<(), StoreError>;

    /// Failed attempt with retry budget left; re-claimable at
    /// `next_retry_at`.
    async fn mark_failed(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
        next_retry_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Terminal transition: retry budget exhausted.
    async fn mark_dead_letter(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
    ) -> Result<(), StoreError>;

    /// Status/channel pairs for a group's jobs created since `since`.
    async fn job_status_rows(
        &self,
        group_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<JobStatusRow>, StoreError>;
}

/// Postgres-backed job store.
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn group_recipients(
        &self,
        group_id: DbId,
        parent_id: DbId,
    ) -> Result<Vec<Recipient>, StoreError> {
        Ok(RecipientRepo::list_for_group(&self.pool, group_id, parent_id).await?)
    }

    async fn recipient(&self, recipient_id: DbId) -> Result<Option<Recipient>, StoreError> {
        Ok(RecipientRepo::find(&self.pool, recipient_id).await?)
    }

    async fn membership(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<GroupMembership>, StoreError> {
        Ok(MembershipRepo::find(&self.pool, recipient_id, group_id).await?)
    }

    async fn group(&self, group_id: DbId) -> Result<Option<RecipientGroup>, StoreError> {
        Ok(GroupRepo::find(&self.pool, group_id).await?)
    }

    async fn insert_jobs(
        &self,
        jobs: &[NewNotificationJob],
    ) -> Result<Vec<NotificationJob>, StoreError> {
        Ok(NotificationJobRepo::insert_batch(&self.pool, jobs).await?)
    }

    async fn claim_due_jobs(&self, limit: i64) -> Result<Vec<NotificationJob>, StoreError> {
        Ok(NotificationJobRepo::claim_due(&self.pool, limit).await?)
    }

    async fn mark_sent(
        &self,
        job_id: DbId,
        provider_message_id: Option<&str>,
    ) -> Result<(), StoreError> {
        Ok(NotificationJobRepo::mark_sent(&self.pool, job_id, provider_message_id).await?)
    }

    async fn mark_skipped(&self, job_id: DbId, reason: &str) -> Result<(), StoreError> {
        Ok(NotificationJobRepo::mark_skipped(&self.pool, job_id, reason).await?)
    }

    async fn mark_failed(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
        next_retry_at: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(
            NotificationJobRepo::mark_failed(&self.pool, job_id, reason, retry_count, next_retry_at)
                .await?,
        )
    }

    async fn mark_dead_letter(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
    ) -> Result<(), StoreError> {
        Ok(NotificationJobRepo::mark_dead_letter(&self.pool, job_id, reason, retry_count).await?)
    }

    async fn job_status_rows(
        &self,
        group_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<JobStatusRow>, StoreError> {
        Ok(NotificationJobRepo::status_rows_since(&self.pool, group_id, since).await?)
    }
}
