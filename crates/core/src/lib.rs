//! Domain logic for the Tribe notification engine.
//!
//! Everything in this crate is pure: enums and value types shared across
//! the workspace, the digest scheduling rule, the delivery-job state
//! machine, the retry schedule, and the degradation policy that decides
//! how resolution functions behave when the preference authority is
//! unreachable. No database or network access lives here.

pub mod channels;
pub mod contact;
pub mod digest;
pub mod notifications;
pub mod policy;
pub mod retry;
pub mod status;
pub mod types;

pub use channels::DeliveryChannel;
pub use notifications::{
    ContentType, EffectiveSettings, MuteSettings, NotificationFrequency, NotificationType,
    SettingsSource, UrgencyLevel,
};
pub use policy::DegradationPolicy;
pub use status::JobStatus;
