//! In-memory doubles and fixtures shared by the unit tests.
//!
//! The engine only touches external state through the
//! [`PreferenceAuthority`] and [`JobStore`] seams, so the suites swap in
//! these implementations and drive failure injection through their
//! `state()` handles.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tribe_core::channels::DeliveryChannel;
use tribe_core::notifications::{
    ContentType, EffectiveSettings, MuteSettings, NotificationType, UrgencyLevel,
};
use tribe_core::status::{state_machine, JobStatus};
use tribe_core::types::{DbId, Timestamp};
use tribe_db::models::{
    GroupMembership, JobStatusRow, NewNotificationJob, NotificationJob, Recipient, RecipientGroup,
};

use crate::authority::PreferenceAuthority;
use crate::delivery::{ChannelTransport, DeliveryReceipt, DeliveryRequest, TransportError};
use crate::error::{AuthorityError, StoreError};
use crate::materialize::UpdateContent;
use crate::store::JobStore;

// ---------------------------------------------------------------------------
// StubAuthority
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AuthorityState {
    pub muted: HashSet<DbId>,
    pub mute_settings: HashMap<DbId, MuteSettings>,
    pub settings: HashMap<DbId, EffectiveSettings>,
    pub ineligible: HashSet<DbId>,
    pub fail_mute_checks: bool,
    pub fail_mute_settings: bool,
    pub fail_settings: bool,
    pub fail_gate: bool,
}

/// Scriptable in-memory preference authority.
#[derive(Default)]
pub struct StubAuthority {
    state: Mutex<AuthorityState>,
}

impl StubAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, AuthorityState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl PreferenceAuthority for StubAuthority {
    async fn is_muted(
        &self,
        recipient_id: DbId,
        _group_id: Option<DbId>,
    ) -> Result<bool, AuthorityError> {
        let state = self.state();
        if state.fail_mute_checks {
            return Err(AuthorityError::Unavailable("mute check down".to_string()));
        }
        Ok(state.muted.contains(&recipient_id))
    }

    async fn mute_settings(
        &self,
        recipient_id: DbId,
        _group_id: Option<DbId>,
    ) -> Result<MuteSettings, AuthorityError> {
        let state = self.state();
        if state.fail_mute_settings {
            return Err(AuthorityError::Unavailable("mute settings down".to_string()));
        }
        Ok(state
            .mute_settings
            .get(&recipient_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn effective_settings(
        &self,
        recipient_id: DbId,
        _group_id: DbId,
    ) -> Result<Option<EffectiveSettings>, AuthorityError> {
        let state = self.state();
        if state.fail_settings {
            return Err(AuthorityError::Unavailable("settings down".to_string()));
        }
        Ok(state.settings.get(&recipient_id).cloned())
    }

    async fn should_deliver(
        &self,
        recipient_id: DbId,
        _group_id: DbId,
        _notification_type: NotificationType,
        _urgency: UrgencyLevel,
    ) -> Result<bool, AuthorityError> {
        let state = self.state();
        if state.fail_gate {
            return Err(AuthorityError::Unavailable("gate down".to_string()));
        }
        Ok(!state.ineligible.contains(&recipient_id))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StoreState {
    pub recipients: Vec<Recipient>,
    pub memberships: Vec<GroupMembership>,
    pub groups: Vec<RecipientGroup>,
    pub jobs: Vec<NotificationJob>,
    pub fail_inserts: bool,
    pub fail_lookups: bool,
    next_job_id: DbId,
}

/// In-memory job store with the same transition discipline as Postgres.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }
}

/// Apply a status transition, panicking on one Postgres would reject.
fn transition(job: &mut NotificationJob, to: JobStatus) {
    let from = JobStatus::parse(&job.status).expect("known job status");
    assert!(
        state_machine::can_transition(from, to),
        "invalid job transition {from:?} -> {to:?}"
    );
    job.status = to.as_str().to_string();
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn group_recipients(
        &self,
        group_id: DbId,
        parent_id: DbId,
    ) -> Result<Vec<Recipient>, StoreError> {
        let state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookups down".to_string()));
        }
        let members: HashSet<DbId> = state
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id && m.is_active)
            .map(|m| m.recipient_id)
            .collect();
        Ok(state
            .recipients
            .iter()
            .filter(|r| r.parent_id == parent_id && r.is_active && members.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn recipient(&self, recipient_id: DbId) -> Result<Option<Recipient>, StoreError> {
        let state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookups down".to_string()));
        }
        Ok(state.recipients.iter().find(|r| r.id == recipient_id).cloned())
    }

    async fn membership(
        &self,
        recipient_id: DbId,
        group_id: DbId,
    ) -> Result<Option<GroupMembership>, StoreError> {
        let state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookups down".to_string()));
        }
        Ok(state
            .memberships
            .iter()
            .find(|m| m.recipient_id == recipient_id && m.group_id == group_id)
            .cloned())
    }

    async fn group(&self, group_id: DbId) -> Result<Option<RecipientGroup>, StoreError> {
        let state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookups down".to_string()));
        }
        Ok(state.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn insert_jobs(
        &self,
        jobs: &[NewNotificationJob],
    ) -> Result<Vec<NotificationJob>, StoreError> {
        let mut state = self.state();
        if state.fail_inserts {
            return Err(StoreError::Unavailable("inserts down".to_string()));
        }
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(jobs.len());
        for job in jobs {
            state.next_job_id += 1;
            let row = NotificationJob {
                id: state.next_job_id,
                job_key: job.job_key.clone(),
                update_id: job.update_id,
                group_id: job.group_id,
                recipient_id: job.recipient_id,
                channel: job.channel.as_str().to_string(),
                notification_type: job.notification_type.as_str().to_string(),
                urgency: job.urgency.as_str().to_string(),
                content: job.content.clone(),
                scheduled_for: job.scheduled_for,
                status: JobStatus::Pending.as_str().to_string(),
                retry_count: 0,
                next_retry_at: None,
                provider_message_id: None,
                failure_reason: None,
                processed_at: None,
                created_at: now,
            };
            inserted.push(row.clone());
            state.jobs.push(row);
        }
        Ok(inserted)
    }

    async fn claim_due_jobs(&self, limit: i64) -> Result<Vec<NotificationJob>, StoreError> {
        let mut state = self.state();
        let now = Utc::now();
        let mut due: Vec<usize> = state
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| {
                (j.status == JobStatus::Pending.as_str() && j.scheduled_for <= now)
                    || (j.status == JobStatus::Failed.as_str()
                        && j.next_retry_at.is_some_and(|at| at <= now))
            })
            .map(|(i, _)| i)
            .collect();
        due.sort_by_key(|&i| state.jobs[i].scheduled_for);
        due.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for i in due {
            transition(&mut state.jobs[i], JobStatus::Processing);
            claimed.push(state.jobs[i].clone());
        }
        Ok(claimed)
    }

    async fn mark_sent(
        &self,
        job_id: DbId,
        provider_message_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let job = find_job(&mut state, job_id)?;
        transition(job, JobStatus::Sent);
        job.provider_message_id = provider_message_id.map(String::from);
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_skipped(&self, job_id: DbId, reason: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        let job = find_job(&mut state, job_id)?;
        transition(job, JobStatus::Skipped);
        job.failure_reason = Some(reason.to_string());
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
        next_retry_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let job = find_job(&mut state, job_id)?;
        transition(job, JobStatus::Failed);
        job.failure_reason = Some(reason.to_string());
        job.retry_count = retry_count;
        job.next_retry_at = Some(next_retry_at);
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_dead_letter(
        &self,
        job_id: DbId,
        reason: &str,
        retry_count: i32,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let job = find_job(&mut state, job_id)?;
        transition(job, JobStatus::DeadLetter);
        job.failure_reason = Some(reason.to_string());
        job.retry_count = retry_count;
        job.next_retry_at = None;
        job.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn job_status_rows(
        &self,
        group_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<JobStatusRow>, StoreError> {
        let state = self.state();
        if state.fail_lookups {
            return Err(StoreError::Unavailable("lookups down".to_string()));
        }
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.group_id == group_id && j.created_at >= since)
            .map(|j| JobStatusRow {
                status: j.status.clone(),
                channel: j.channel.clone(),
            })
            .collect())
    }
}

fn find_job(state: &mut StoreState, job_id: DbId) -> Result<&mut NotificationJob, StoreError> {
    state
        .jobs
        .iter_mut()
        .find(|j| j.id == job_id)
        .ok_or_else(|| StoreError::Unavailable(format!("no job {job_id}")))
}

// ---------------------------------------------------------------------------
// StubTransport
// ---------------------------------------------------------------------------

/// Transport double recording every request it accepts.
pub struct StubTransport {
    channel: DeliveryChannel,
    sent: Mutex<Vec<DeliveryRequest>>,
    fail_with: Mutex<Option<String>>,
}

impl StubTransport {
    pub fn new(channel: DeliveryChannel) -> Self {
        Self {
            channel,
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// Make every subsequent send fail with a provider error.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn sent(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelTransport for StubTransport {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    async fn send(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, TransportError> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(TransportError::Provider {
                status: 550,
                message,
            });
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(DeliveryReceipt {
            provider_message_id: Some("msg-1".to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn recipient(
    id: DbId,
    parent_id: DbId,
    email: Option<&str>,
    phone: Option<&str>,
) -> Recipient {
    Recipient {
        id,
        parent_id,
        name: format!("Recipient {id}"),
        email: email.map(String::from),
        phone: phone.map(String::from),
        preference_token: format!("tok-{id}"),
        relationship: "grandparent".to_string(),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Active membership with no overrides.
pub fn membership(recipient_id: DbId, group_id: DbId) -> GroupMembership {
    GroupMembership {
        id: recipient_id * 1000 + group_id,
        group_id,
        recipient_id,
        notification_frequency: None,
        preferred_channels: None,
        content_types: None,
        mute_until: None,
        mute_settings: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn recipient_group(id: DbId, default_frequency: &str, channels: &[&str]) -> RecipientGroup {
    RecipientGroup {
        id,
        parent_id: 7,
        name: format!("Group {id}"),
        default_frequency: default_frequency.to_string(),
        default_channels: serde_json::json!(channels),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn update_content() -> UpdateContent {
    UpdateContent {
        subject: "First steps".to_string(),
        body: "Ella walked today!".to_string(),
        content_type: ContentType::Text,
    }
}

/// A pending job whose `scheduled_for` is already in the past.
pub fn due_job(id: DbId, recipient_id: DbId, group_id: DbId, channel: DeliveryChannel) -> NotificationJob {
    let now = Utc::now();
    NotificationJob {
        id,
        job_key: format!("100_{recipient_id}_{}_{}", channel.as_str(), now.timestamp_millis()),
        update_id: 100,
        group_id,
        recipient_id,
        channel: channel.as_str().to_string(),
        notification_type: NotificationType::Immediate.as_str().to_string(),
        urgency: UrgencyLevel::Normal.as_str().to_string(),
        content: serde_json::json!({
            "update": {
                "subject": "First steps",
                "body": "Ella walked today!",
                "content_type": "text",
            },
        }),
        scheduled_for: now - chrono::Duration::minutes(1),
        status: JobStatus::Pending.as_str().to_string(),
        retry_count: 0,
        next_retry_at: None,
        provider_message_id: None,
        failure_reason: None,
        processed_at: None,
        created_at: now - chrono::Duration::minutes(1),
    }
}

/// A due job row for the delivery-request tests.
pub fn job_row(
    id: DbId,
    recipient: &Recipient,
    channel: DeliveryChannel,
    subject: &str,
    body: &str,
) -> NotificationJob {
    let mut job = due_job(id, recipient.id, 4, channel);
    job.content = serde_json::json!({
        "update": { "subject": subject, "body": body, "content_type": "text" },
    });
    job
}

pub fn status_row(status: &str, channel: &str) -> JobStatusRow {
    JobStatusRow {
        status: status.to_string(),
        channel: channel.to_string(),
    }
}
