//! Delivery-job status and its state machine.
//!
//! A job is created `pending`, claimed into `processing` by a batch
//! processor, and finishes `sent`, `skipped`, `failed` or `dead_letter`.
//! `failed` is re-claimable until the attempt budget runs out (see
//! [`crate::retry`]); `sent`, `skipped` and `dead_letter` are terminal.

use serde::{Deserialize, Serialize};

/// Status of a notification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting for its `scheduled_for` time.
    #[serde(rename = "pending")]
    Pending,
    /// Claimed by a processor; a delivery attempt is in flight.
    #[serde(rename = "processing")]
    Processing,
    /// Accepted by the channel provider.
    #[serde(rename = "sent")]
    Sent,
    /// Last attempt failed; re-claimable once `next_retry_at` passes.
    #[serde(rename = "failed")]
    Failed,
    /// Re-validation rejected the job before any delivery attempt.
    #[serde(rename = "skipped")]
    Skipped,
    /// Attempt budget exhausted; no further processing.
    #[serde(rename = "dead_letter")]
    DeadLetter,
}

impl JobStatus {
    /// String code for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
            JobStatus::DeadLetter => "dead_letter",
        }
    }

    /// Parse a stored string code. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "sent" => Some(JobStatus::Sent),
            "failed" => Some(JobStatus::Failed),
            "skipped" => Some(JobStatus::Skipped),
            "dead_letter" => Some(JobStatus::DeadLetter),
            _ => None,
        }
    }

    /// Whether no further transition is allowed from this status.
    pub fn is_terminal(&self) -> bool {
        state_machine::valid_transitions(*self).is_empty()
    }
}

pub mod state_machine {
    use super::JobStatus;

    /// Returns the set of statuses reachable from `from`.
    ///
    /// Terminal statuses return an empty slice.
    pub fn valid_transitions(from: JobStatus) -> &'static [JobStatus] {
        match from {
            JobStatus::Pending => &[JobStatus::Processing],
            JobStatus::Processing => &[
                JobStatus::Sent,
                JobStatus::Failed,
                JobStatus::Skipped,
                JobStatus::DeadLetter,
            ],
            // Failed jobs go back through a claim, never straight to a
            // terminal status.
            JobStatus::Failed => &[JobStatus::Processing],
            JobStatus::Sent | JobStatus::Skipped | JobStatus::DeadLetter => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        valid_transitions(from).contains(&to)
    }
}
