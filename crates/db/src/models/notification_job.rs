//! Notification job entity models and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use tribe_core::channels::DeliveryChannel;
use tribe_core::notifications::{NotificationType, UrgencyLevel};
use tribe_core::types::{DbId, Timestamp};

/// A row from the `notification_jobs` table: one scheduled delivery of one
/// update to one recipient over one channel.
///
/// Created `pending` by a generation pass; only the batch processor moves
/// it afterwards. `failure_reason` records why a job was skipped as well
/// as why an attempt failed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationJob {
    pub id: DbId,
    /// Unique per generation pass: `{update}_{recipient}_{channel}_{millis}`.
    pub job_key: String,
    pub update_id: DbId,
    pub group_id: DbId,
    pub recipient_id: DbId,
    pub channel: String,
    pub notification_type: String,
    pub urgency: String,
    /// Rendered update plus the settings snapshot that produced the
    /// schedule.
    pub content: serde_json::Value,
    pub scheduled_for: Timestamp,
    pub status: String,
    /// Completed delivery attempts.
    pub retry_count: i32,
    pub next_retry_at: Option<Timestamp>,
    pub provider_message_id: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for one notification job. Status starts `pending`.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotificationJob {
    pub job_key: String,
    pub update_id: DbId,
    pub group_id: DbId,
    pub recipient_id: DbId,
    pub channel: DeliveryChannel,
    pub notification_type: NotificationType,
    pub urgency: UrgencyLevel,
    pub content: serde_json::Value,
    pub scheduled_for: Timestamp,
}

/// Status/channel pair used by analytics aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct JobStatusRow {
    pub status: String,
    pub channel: String,
}
