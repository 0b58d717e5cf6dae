//! Retry schedule for failed delivery attempts.
//!
//! A job gets [`MAX_DELIVERY_ATTEMPTS`] attempts in total. After a failed
//! attempt that leaves budget, the job is re-enqueued at
//! [`next_retry_at`]; once the budget is exhausted it is dead-lettered
//! and never claimed again.

use crate::types::Timestamp;

/// Total delivery attempts before a job is dead-lettered.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 4;

/// Base retry delay in seconds (5 minutes), quadrupled per attempt:
/// 5 min, 20 min, 80 min.
const BASE_RETRY_DELAY_SECS: i64 = 300;

/// Whether a job that has made `attempts` delivery attempts may retry.
pub fn has_attempts_remaining(attempts: i32) -> bool {
    attempts < MAX_DELIVERY_ATTEMPTS
}

/// Backoff delay in seconds after the `attempts`-th failed attempt.
pub fn retry_delay_secs(attempts: i32) -> i64 {
    // Exponent clamped so a bad attempt counter cannot overflow.
    let exponent = attempts.clamp(1, 6) - 1;
    BASE_RETRY_DELAY_SECS * 4i64.pow(exponent as u32)
}

/// When the next attempt becomes due.
pub fn next_retry_at(attempts: i32, now: Timestamp) -> Timestamp {
    now + chrono::Duration::seconds(retry_delay_secs(attempts))
}
