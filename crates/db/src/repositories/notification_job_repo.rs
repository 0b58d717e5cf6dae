//! Repository for the `notification_jobs` table.
//!
//! Job rows move `pending → processing → sent | skipped | failed |
//! dead_letter` (see `tribe_core::status`). The claim query is the only
//! reader of due jobs and uses `FOR UPDATE SKIP LOCKED`, so concurrent
//! processor runs never pick up the same row.

use sqlx::PgPool;
use tribe_core::status::JobStatus;
use tribe_core::types::{DbId, Timestamp};

use crate::models::notification_job::{JobStatusRow, NewNotificationJob, NotificationJob};

/// Column list for `notification_jobs` queries.
const COLUMNS: &str = "id, job_key, update_id, group_id, recipient_id, channel, \
    notification_type, urgency, content, scheduled_for, status, retry_count, \
    next_retry_at, provider_message_id, failure_reason, processed_at, created_at";

/// Provides persistence for notification jobs.
pub struct NotificationJobRepo;

impl NotificationJobRepo {
    /// Insert a batch of jobs in one transaction.
    ///
    /// All-or-nothing: any insert failure rolls the whole generation pass
    /// back and propagates.
    pub async fn insert_batch(
        pool: &PgPool,
        jobs: &[NewNotificationJob],
    ) -> Result<Vec<NotificationJob>, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_jobs \
                (job_key, update_id, group_id, recipient_id, channel, \
                 notification_type, urgency, content, scheduled_for, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(jobs.len());
        for job in jobs {
            let row = sqlx::query_as::<_, NotificationJob>(&query)
                .bind(&job.job_key)
                .bind(job.update_id)
                .bind(job.group_id)
                .bind(job.recipient_id)
                .bind(job.channel.as_str())
                .bind(job.notification_type.as_str())
                .bind(job.urgency.as_str())
                .bind(&job.content)
                .bind(job.scheduled_for)
                .bind(JobStatus::Pending.as_str())
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Atomically claim up to `limit` due jobs, moving them to `processing`.
    ///
    /// Due means `pending` past its `scheduled_for`, or `failed` past its
    /// `next_retry_at`. `FOR UPDATE SKIP LOCKED` keeps two concurrent
    /// processors from claiming the same row. Row order in the result is
    /// not guaranteed; callers sort by `scheduled_for`.
    pub async fn claim_due(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<NotificationJob>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_jobs \
             SET status = $1 \
             WHERE id IN ( \
                 SELECT id FROM notification_jobs \
                 WHERE (status = $2 AND scheduled_for <= NOW()) \
                    OR (status = $3 AND next_retry_at IS NOT NULL AND next_retry_at <= NOW()) \
                 ORDER BY scheduled_for ASC \
                 LIMIT $4 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationJob>(&query)
            .bind(JobStatus::Processing.as_str())
            .bind(JobStatus::Pending.as_str())
            .bind(JobStatus::Failed.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a job delivered.
    pub async fn mark_sent(
        pool: &PgPool,
        job_id: DbId,
        provider_message_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, provider_message_id = $3, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Sent.as_str())
        .bind(provider_message_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job skipped by re-validation, with the reason it was rejected.
    pub async fn mark_skipped(pool: &PgPool, job_id: DbId, reason: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, failure_reason = $3, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Skipped.as_str())
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt that still has retry budget.
    pub async fn mark_failed(
        pool: &PgPool,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
        next_retry_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, failure_reason = $3, retry_count = $4, \
                 next_retry_at = $5, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.as_str())
        .bind(reason)
        .bind(retry_count)
        .bind(next_retry_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt that exhausted the retry budget.
    pub async fn mark_dead_letter(
        pool: &PgPool,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_jobs \
             SET status = $2, failure_reason = $3, retry_count = $4, \
                 next_retry_at = NULL, processed_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::DeadLetter.as_str())
        .bind(reason)
        .bind(retry_count)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Status/channel pairs for a group's jobs created since `since`.
    pub async fn status_rows_since(
        pool: &PgPool,
        group_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<JobStatusRow>, sqlx::Error> {
        sqlx::query_as::<_, JobStatusRow>(
            "SELECT status, channel FROM notification_jobs \
             WHERE group_id = $1 AND created_at >= $2",
        )
        .bind(group_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }
}
