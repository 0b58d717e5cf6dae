//! Digest delivery-time rule.
//!
//! Maps a recipient's batching frequency to the next digest window:
//! daily digests go out tomorrow at 08:00, weekly digests on the next
//! Sunday at 08:00. The rule is a pure function of the passed clock, so
//! callers decide which timeline (UTC or a zone-shifted one) the 08:00
//! window is interpreted in.

use chrono::{Datelike, Days, NaiveTime};

use crate::notifications::NotificationFrequency;
use crate::types::Timestamp;

/// Hour of day (00-23) at which digests are delivered.
pub const DIGEST_DELIVERY_HOUR: u32 = 8;

/// Compute the delivery time for an update under the given frequency.
///
/// - `daily_digest`: tomorrow at 08:00.
/// - `weekly_digest`: the next Sunday at 08:00. When `now` already is a
///   Sunday the digest rolls a full week out, never "later today".
/// - `every_update` and `milestones_only`: `now`, unshifted.
pub fn digest_delivery_time(frequency: NotificationFrequency, now: Timestamp) -> Timestamp {
    match frequency {
        NotificationFrequency::DailyDigest => {
            at_digest_hour(now, 1)
        }
        NotificationFrequency::WeeklyDigest => {
            let days_until_sunday = match (7 - now.weekday().num_days_from_sunday() as u64) % 7 {
                0 => 7,
                d => d,
            };
            at_digest_hour(now, days_until_sunday)
        }
        NotificationFrequency::EveryUpdate | NotificationFrequency::MilestonesOnly => now,
    }
}

/// 08:00 on the day `days_ahead` days after `now`, in `now`'s timeline.
fn at_digest_hour(now: Timestamp, days_ahead: u64) -> Timestamp {
    let time = NaiveTime::from_hms_opt(DIGEST_DELIVERY_HOUR, 0, 0).expect("valid digest hour");
    (now.date_naive() + Days::new(days_ahead)).and_time(time).and_utc()
}
