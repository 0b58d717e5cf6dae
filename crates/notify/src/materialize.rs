//! Job materialization: one shared update fanned out into per-recipient,
//! per-channel delivery jobs.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tribe_core::channels::DeliveryChannel;
use tribe_core::digest::digest_delivery_time;
use tribe_core::notifications::{
    ContentType, EffectiveSettings, NotificationFrequency, NotificationType, UrgencyLevel,
};
use tribe_core::policy::DegradationPolicy;
use tribe_core::types::{DbId, Timestamp};
use tribe_db::models::{NewNotificationJob, NotificationJob};

use crate::authority::PreferenceAuthority;
use crate::eligibility::DeliveryGate;
use crate::error::StoreError;
use crate::settings::SettingsResolver;
use crate::store::JobStore;

/// Options for one job-generation pass.
#[derive(Debug, Clone, Default)]
pub struct CreateJobOptions {
    /// Minutes to delay the first delivery attempt.
    pub schedule_delay_minutes: i64,
    pub notification_type: NotificationType,
    pub urgency: UrgencyLevel,
}

/// The rendered update as it goes into job payloads.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateContent {
    pub subject: String,
    pub body: String,
    pub content_type: ContentType,
}

/// Materializes notification jobs for an update shared with a group.
pub struct NotificationScheduler {
    store: Arc<dyn JobStore>,
    gate: DeliveryGate,
    settings: SettingsResolver,
}

impl NotificationScheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        authority: Arc<dyn PreferenceAuthority>,
        policy: DegradationPolicy,
    ) -> Self {
        Self {
            gate: DeliveryGate::new(authority.clone(), policy),
            settings: SettingsResolver::new(authority, store.clone()),
            store,
        }
    }

    /// Create pending delivery jobs for one update shared with one group.
    ///
    /// Per recipient: check eligibility (ineligible recipients are logged
    /// and produce no jobs), resolve settings, compute the delivery time,
    /// then emit one job per resolved channel the recipient can actually
    /// receive on. The whole pass inserts atomically; a persistence
    /// failure aborts it and nothing is kept.
    pub async fn create_jobs(
        &self,
        update_id: DbId,
        group_id: DbId,
        parent_id: DbId,
        content: &UpdateContent,
        options: &CreateJobOptions,
    ) -> Result<Vec<NotificationJob>, StoreError> {
        let recipients = self.store.group_recipients(group_id, parent_id).await?;
        let now = Utc::now();
        let mut new_jobs = Vec::new();

        for recipient in &recipients {
            let eligible = self
                .gate
                .should_deliver(
                    recipient.id,
                    group_id,
                    options.notification_type,
                    options.urgency,
                )
                .await;
            if !eligible {
                tracing::info!(
                    recipient_id = recipient.id,
                    group_id,
                    update_id,
                    "Recipient ineligible, no jobs created"
                );
                continue;
            }

            let settings = self.settings.effective_settings(recipient.id, group_id).await;
            let scheduled_for = schedule_time(options, &settings, now);

            for channel in &settings.channels {
                if !recipient.can_receive(*channel) {
                    tracing::debug!(
                        recipient_id = recipient.id,
                        channel = %channel,
                        "Recipient has no address for channel, skipping"
                    );
                    continue;
                }
                new_jobs.push(NewNotificationJob {
                    job_key: job_key(update_id, recipient.id, *channel, now),
                    update_id,
                    group_id,
                    recipient_id: recipient.id,
                    channel: *channel,
                    notification_type: options.notification_type,
                    urgency: options.urgency,
                    content: job_content(content, &settings),
                    scheduled_for,
                });
            }
        }

        if new_jobs.is_empty() {
            return Ok(Vec::new());
        }

        let inserted = self.store.insert_jobs(&new_jobs).await?;
        tracing::info!(
            update_id,
            group_id,
            jobs = inserted.len(),
            "Notification jobs created"
        );
        Ok(inserted)
    }
}

/// Delivery time for one recipient's jobs.
///
/// An immediate request is demoted to the recipient's digest window when
/// their resolved frequency batches updates; otherwise the optional
/// schedule delay applies.
fn schedule_time(
    options: &CreateJobOptions,
    settings: &EffectiveSettings,
    now: Timestamp,
) -> Timestamp {
    if options.notification_type == NotificationType::Immediate
        && settings.frequency != NotificationFrequency::EveryUpdate
    {
        return digest_delivery_time(settings.frequency, now);
    }
    now + chrono::Duration::minutes(options.schedule_delay_minutes)
}

/// Unique key for one job within a generation pass.
fn job_key(update_id: DbId, recipient_id: DbId, channel: DeliveryChannel, now: Timestamp) -> String {
    format!(
        "{update_id}_{recipient_id}_{}_{}",
        channel.as_str(),
        now.timestamp_millis()
    )
}

/// Job payload: the rendered update plus the settings snapshot that
/// produced the schedule.
fn job_content(content: &UpdateContent, settings: &EffectiveSettings) -> serde_json::Value {
    serde_json::json!({
        "update": content,
        "settings": settings,
    })
}
