//! Row models and DTOs.

pub mod group;
pub mod membership;
pub mod notification_job;
pub mod recipient;

pub use group::RecipientGroup;
pub use membership::GroupMembership;
pub use notification_job::{JobStatusRow, NewNotificationJob, NotificationJob};
pub use recipient::Recipient;
