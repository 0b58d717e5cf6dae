//! Delivery statistics over a trailing window.
//!
//! The one place in the engine where errors are not swallowed: a wrong
//! delivery-rate number is worse than a visible failure, so store errors
//! propagate to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tribe_core::status::JobStatus;
use tribe_core::types::DbId;
use tribe_db::models::JobStatusRow;

use crate::error::StoreError;
use crate::store::JobStore;

/// Default trailing window, in days.
pub const DEFAULT_ANALYTICS_WINDOW_DAYS: i64 = 30;

/// Aggregated job outcomes for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_jobs: u64,
    pub sent: u64,
    pub failed: u64,
    pub dead_letter: u64,
    pub skipped: u64,
    /// Jobs not yet through a delivery attempt (pending or claimed).
    pub pending: u64,
    /// Volume per channel, all statuses.
    pub by_channel: BTreeMap<String, u64>,
    /// Percentage of attempted deliveries that were accepted; `0.0` when
    /// nothing has been attempted yet.
    pub delivery_rate: f64,
}

/// Read-only reporting over the notification-job table.
pub struct NotificationAnalytics {
    store: Arc<dyn JobStore>,
}

impl NotificationAnalytics {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Aggregate a group's job outcomes for the trailing `days` window.
    pub async fn for_group(
        &self,
        group_id: DbId,
        days: i64,
    ) -> Result<AnalyticsSummary, StoreError> {
        let since = Utc::now() - chrono::Duration::days(days);
        let rows = self.store.job_status_rows(group_id, since).await?;
        Ok(summarize(&rows))
    }
}

/// Fold status/channel rows into a summary.
fn summarize(rows: &[JobStatusRow]) -> AnalyticsSummary {
    let mut summary = AnalyticsSummary {
        total_jobs: rows.len() as u64,
        sent: 0,
        failed: 0,
        dead_letter: 0,
        skipped: 0,
        pending: 0,
        by_channel: BTreeMap::new(),
        delivery_rate: 0.0,
    };

    for row in rows {
        *summary.by_channel.entry(row.channel.clone()).or_insert(0) += 1;
        match JobStatus::parse(&row.status) {
            Some(JobStatus::Sent) => summary.sent += 1,
            Some(JobStatus::Failed) => summary.failed += 1,
            Some(JobStatus::DeadLetter) => summary.dead_letter += 1,
            Some(JobStatus::Skipped) => summary.skipped += 1,
            Some(JobStatus::Pending) | Some(JobStatus::Processing) => summary.pending += 1,
            None => {}
        }
    }

    let attempts = summary.sent + summary.failed + summary.dead_letter;
    if attempts > 0 {
        summary.delivery_rate = summary.sent as f64 / attempts as f64 * 100.0;
    }
    summary
}
