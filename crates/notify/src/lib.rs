//! The Tribe notification engine.
//!
//! Turns one shared update into per-recipient delivery jobs and drains
//! those jobs through channel transports:
//!
//! - [`MuteResolver`] — mute determination with the urgent-override rule.
//! - [`SettingsResolver`] — tri-tier effective-settings resolution
//!   (member override, group default, system default).
//! - [`DeliveryGate`] — the combined server-side eligibility check.
//! - [`NotificationScheduler`] — job materialization, including digest
//!   demotion and channel viability filtering.
//! - [`BatchProcessor`] — claims due jobs, re-validates, delivers through
//!   the registered [`delivery`] transports, and applies the retry
//!   schedule.
//! - [`NotificationAnalytics`] — windowed delivery statistics.
//!
//! External state lives behind the [`PreferenceAuthority`] and
//! [`JobStore`] seams; Postgres implementations are provided and tests
//! substitute in-memory ones.

pub mod analytics;
pub mod authority;
pub mod delivery;
pub mod eligibility;
pub mod error;
pub mod materialize;
pub mod mute;
pub mod processor;
pub mod settings;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::{AnalyticsSummary, NotificationAnalytics};
pub use authority::{PgPreferenceAuthority, PreferenceAuthority};
pub use delivery::{ChannelTransport, DeliveryReceipt, DeliveryRequest, TransportRegistry};
pub use eligibility::DeliveryGate;
pub use error::{AuthorityError, StoreError};
pub use materialize::{CreateJobOptions, NotificationScheduler, UpdateContent};
pub use mute::MuteResolver;
pub use processor::{BatchProcessor, DeliveryResult, DeliveryStatus, DEFAULT_BATCH_SIZE};
pub use settings::SettingsResolver;
pub use store::{JobStore, PgJobStore};
