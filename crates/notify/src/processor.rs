//! Batch delivery of due notification jobs.
//!
//! [`BatchProcessor::process_pending`] claims due jobs, re-validates each
//! against the eligibility gate (mute state and settings can change
//! between job creation and delivery), then hands the rendered message to
//! the channel's transport. Failed attempts are re-enqueued on the retry
//! schedule until the attempt budget runs out, after which the job is
//! dead-lettered. A failure on one job never aborts the batch.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tribe_core::notifications::{NotificationType, UrgencyLevel};
use tribe_core::policy::DegradationPolicy;
use tribe_core::retry::{has_attempts_remaining, next_retry_at};
use tribe_core::types::DbId;
use tribe_db::models::NotificationJob;

use crate::authority::PreferenceAuthority;
use crate::delivery::{DeliveryReceipt, DeliveryRequest, TransportRegistry};
use crate::eligibility::DeliveryGate;
use crate::error::StoreError;
use crate::store::JobStore;

/// Default number of jobs claimed per processing pass.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Reason recorded when re-validation rejects a claimed job.
const SKIP_REASON: &str = "Recipient muted or ineligible";

// ---------------------------------------------------------------------------
// DeliveryResult
// ---------------------------------------------------------------------------

/// Outcome of one delivery attempt, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the channel provider.
    Delivered,
    /// Rejected by re-validation; the job was skipped.
    Muted,
    /// Attempt failed and the job was dead-lettered.
    Failed,
    /// Attempt failed and the job was re-enqueued for retry.
    Scheduled,
}

/// One processed job's outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryResult {
    pub job_id: DbId,
    pub recipient_id: DbId,
    pub group_id: DbId,
    pub channel: String,
    pub status: DeliveryStatus,
    pub reason: Option<String>,
    pub provider_message_id: Option<String>,
}

impl DeliveryResult {
    fn new(job: &NotificationJob, status: DeliveryStatus) -> Self {
        Self {
            job_id: job.id,
            recipient_id: job.recipient_id,
            group_id: job.group_id,
            channel: job.channel.clone(),
            status,
            reason: None,
            provider_message_id: None,
        }
    }

    fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

// ---------------------------------------------------------------------------
// BatchProcessor
// ---------------------------------------------------------------------------

/// Drains due notification jobs through the registered transports.
pub struct BatchProcessor {
    store: Arc<dyn JobStore>,
    gate: DeliveryGate,
    transports: TransportRegistry,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn JobStore>,
        authority: Arc<dyn PreferenceAuthority>,
        policy: DegradationPolicy,
        transports: TransportRegistry,
    ) -> Self {
        Self {
            store,
            gate: DeliveryGate::new(authority, policy),
            transports,
        }
    }

    /// Claim and process up to `batch_size` due jobs, oldest due first.
    ///
    /// Returns one result per claimed job. Jobs outside the batch window
    /// stay pending for a future pass. Only the claim itself can fail;
    /// everything after is isolated per job.
    pub async fn process_pending(
        &self,
        batch_size: i64,
    ) -> Result<Vec<DeliveryResult>, StoreError> {
        let mut jobs = self.store.claim_due_jobs(batch_size).await?;
        // The claim does not guarantee row order.
        jobs.sort_by_key(|job| job.scheduled_for);

        let mut results = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let result = self.process_job(job).await;
            tracing::info!(
                job_id = job.id,
                recipient_id = job.recipient_id,
                channel = %job.channel,
                status = ?result.status,
                "Processed notification job"
            );
            results.push(result);
        }
        Ok(results)
    }

    /// Run one claimed job to a terminal or retryable state.
    async fn process_job(&self, job: &NotificationJob) -> DeliveryResult {
        let notification_type = NotificationType::from_str(&job.notification_type);
        let urgency = UrgencyLevel::from_str(&job.urgency);

        let eligible = self
            .gate
            .should_deliver(job.recipient_id, job.group_id, notification_type, urgency)
            .await;
        if !eligible {
            if let Err(e) = self.store.mark_skipped(job.id, SKIP_REASON).await {
                tracing::error!(job_id = job.id, error = %e, "Failed to record skipped job");
            }
            return DeliveryResult::new(job, DeliveryStatus::Muted).with_reason(SKIP_REASON);
        }

        match self.attempt_delivery(job).await {
            Ok(receipt) => {
                if let Err(e) = self
                    .store
                    .mark_sent(job.id, receipt.provider_message_id.as_deref())
                    .await
                {
                    tracing::error!(job_id = job.id, error = %e, "Failed to record sent job");
                }
                DeliveryResult {
                    provider_message_id: receipt.provider_message_id,
                    ..DeliveryResult::new(job, DeliveryStatus::Delivered)
                }
            }
            Err(reason) => self.record_failure(job, reason).await,
        }
    }

    /// Resolve the transport and recipient address, then send.
    async fn attempt_delivery(&self, job: &NotificationJob) -> Result<DeliveryReceipt, String> {
        let channel = tribe_core::channels::DeliveryChannel::parse(&job.channel)
            .ok_or_else(|| format!("unknown delivery channel: {}", job.channel))?;
        let transport = self
            .transports
            .get(channel)
            .ok_or_else(|| format!("no transport configured for {channel}"))?;

        // Contact info is read fresh so an address fixed after job
        // creation is picked up.
        let recipient = self
            .store
            .recipient(job.recipient_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "recipient no longer exists".to_string())?;

        let request = DeliveryRequest::for_job(job, &recipient, channel)?;
        transport.send(&request).await.map_err(|e| e.to_string())
    }

    /// Apply the retry schedule to a failed attempt.
    async fn record_failure(&self, job: &NotificationJob, reason: String) -> DeliveryResult {
        let attempts = job.retry_count + 1;

        if has_attempts_remaining(attempts) {
            let retry_at = next_retry_at(attempts, Utc::now());
            if let Err(e) = self
                .store
                .mark_failed(job.id, &reason, attempts, retry_at)
                .await
            {
                tracing::error!(job_id = job.id, error = %e, "Failed to record failed job");
            }
            tracing::warn!(
                job_id = job.id,
                attempts,
                retry_at = %retry_at,
                reason = %reason,
                "Delivery failed, retry scheduled"
            );
            DeliveryResult::new(job, DeliveryStatus::Scheduled).with_reason(reason)
        } else {
            if let Err(e) = self.store.mark_dead_letter(job.id, &reason, attempts).await {
                tracing::error!(job_id = job.id, error = %e, "Failed to record dead-lettered job");
            }
            tracing::error!(
                job_id = job.id,
                attempts,
                reason = %reason,
                "Delivery failed, attempt budget exhausted"
            );
            DeliveryResult::new(job, DeliveryStatus::Failed).with_reason(reason)
        }
    }
}
